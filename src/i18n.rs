//! Console labels in English and Spanish.

use std::collections::HashMap;

use crate::session::Language;

const EN: &[(&str, &str)] = &[
    ("navigation.faculty_data", "Faculty Data"),
    ("navigation.professors", "Professors"),
    ("navigation.programs_data", "Programs Data"),
    ("navigation.programs", "Programs"),
    ("navigation.courses", "Courses"),
    ("navigation.terms", "Terms"),
    ("navigation.intakes", "Intake"),
    ("navigation.sections", "Sections"),
    ("navigation.course_deliveries", "Course Deliveries"),
    ("navigation.current_intakes", "Current Intakes"),
    ("common.add", "Add"),
    ("common.edit", "Edit"),
    ("common.delete", "Delete"),
    ("common.save", "Save"),
    ("common.cancel", "Cancel"),
    ("common.back", "Back"),
    ("common.search", "Search"),
    ("common.filter", "Filter"),
    ("common.export", "Export"),
    ("common.import", "Import"),
    ("common.loading", "Loading..."),
    ("common.saving", "Saving..."),
    ("common.updating", "Updating..."),
    ("common.creating", "Creating..."),
    ("common.actions", "Actions"),
    ("common.selected", "{count} selected"),
    ("professors.title", "Professors"),
    ("professors.description", "Manage and view all professors"),
    ("professors.add_professor", "Add Professor"),
    ("professors.edit_professor", "Edit Professor"),
    ("professors.personal_information", "Personal Information"),
    ("professors.professional_information", "Professional Information"),
    ("professors.contact_information", "Contact Information"),
    ("professors.degrees", "Degrees"),
    ("professors.course_possibilities", "Course Possibilities"),
    ("professors.active_courses", "Active Courses"),
    ("professors.name", "Name"),
    ("professors.last_name", "Last Name"),
    ("professors.email", "Personal Email"),
    ("professors.corporate_email", "Corporate Email"),
    ("professors.minimum_number_of_sessions", "PDP (Required Sessions)"),
    ("courses.title", "Courses"),
    ("courses.description", "Manage and view all courses"),
    ("courses.add_course", "Add Course"),
    ("courses.edit_course", "Edit Course"),
    ("courses.course_code", "Course Code"),
    ("courses.course_name", "Course Name"),
    ("courses.credits", "Credits"),
    ("courses.sessions", "Sessions"),
    ("courses.area", "Area"),
    ("sections.title", "Sections"),
    ("sections.description", "Manage and view all sections"),
    ("sections.add_section", "Add Section"),
    ("sections.edit_section", "Edit Section"),
    ("sections.campus", "Campus"),
    ("sections.course_year", "Course Year"),
    ("sections.intake", "Term"),
    ("sections.program", "Program"),
    ("sections.academic_year", "Intake"),
    ("programs.title", "Programs"),
    ("programs.add_program", "Add Program"),
    ("intakes.title", "Intake"),
    ("intakes.add_intake", "Add Intake"),
    ("terms.title", "Terms"),
    ("terms.add_term", "Add Term"),
    ("course_deliveries.title", "Course Deliveries"),
    ("course_deliveries.add_course_delivery", "Add Course Delivery"),
];

const ES: &[(&str, &str)] = &[
    ("navigation.faculty_data", "Datos de Facultad"),
    ("navigation.professors", "Profesores"),
    ("navigation.programs_data", "Datos de Programas"),
    ("navigation.programs", "Programas"),
    ("navigation.courses", "Cursos"),
    ("navigation.terms", "Términos"),
    ("navigation.intakes", "Admisiones"),
    ("navigation.sections", "Secciones"),
    ("navigation.course_deliveries", "Entregas de Cursos"),
    ("navigation.current_intakes", "Admisiones Actuales"),
    ("common.add", "Agregar"),
    ("common.edit", "Editar"),
    ("common.delete", "Eliminar"),
    ("common.save", "Guardar"),
    ("common.cancel", "Cancelar"),
    ("common.back", "Atrás"),
    ("common.search", "Buscar"),
    ("common.filter", "Filtrar"),
    ("common.export", "Exportar"),
    ("common.import", "Importar"),
    ("common.loading", "Cargando..."),
    ("common.saving", "Guardando..."),
    ("common.updating", "Actualizando..."),
    ("common.creating", "Creando..."),
    ("common.actions", "Acciones"),
    ("professors.title", "Profesores"),
    ("professors.description", "Gestionar y ver todos los profesores"),
    ("professors.add_professor", "Agregar Profesor"),
    ("professors.edit_professor", "Editar Profesor"),
    ("professors.personal_information", "Información Personal"),
    ("professors.professional_information", "Información Profesional"),
    ("professors.contact_information", "Información de Contacto"),
    ("professors.degrees", "Títulos"),
    ("professors.course_possibilities", "Posibilidades de Cursos"),
    ("professors.active_courses", "Cursos Activos"),
    ("professors.name", "Nombre"),
    ("professors.last_name", "Apellido"),
    ("professors.email", "Correo Personal"),
    ("professors.corporate_email", "Correo Corporativo"),
    ("professors.minimum_number_of_sessions", "PDP (Sesiones Requeridas)"),
    ("courses.title", "Cursos"),
    ("courses.description", "Gestionar y ver todos los cursos"),
    ("courses.add_course", "Agregar Curso"),
    ("courses.edit_course", "Editar Curso"),
    ("courses.course_code", "Código del Curso"),
    ("courses.course_name", "Nombre del Curso"),
    ("courses.credits", "Créditos"),
    ("courses.sessions", "Sesiones"),
    ("courses.area", "Área"),
    ("sections.title", "Secciones"),
    ("sections.description", "Gestionar y ver todas las secciones"),
    ("sections.add_section", "Agregar Sección"),
    ("sections.edit_section", "Editar Sección"),
    ("sections.campus", "Campus"),
    ("sections.course_year", "Año del Curso"),
    ("sections.intake", "Admisión"),
    ("sections.program", "Programa"),
    ("sections.academic_year", "Año Académico"),
    ("programs.title", "Programas"),
    ("programs.add_program", "Agregar Programa"),
    ("intakes.title", "Admisiones"),
    ("intakes.add_intake", "Agregar Admisión"),
    ("terms.title", "Términos"),
    ("terms.add_term", "Agregar Término"),
    ("course_deliveries.title", "Entregas de Cursos"),
    ("course_deliveries.add_course_delivery", "Agregar Entrega de Curso"),
];

fn dictionary(language: Language) -> &'static [(&'static str, &'static str)] {
    match language {
        Language::En => EN,
        Language::Es => ES,
    }
}

fn lookup(language: Language, key: &str) -> Option<&'static str> {
    dictionary(language)
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// Translated label for a dotted key. Missing Spanish entries fall back
/// to English; keys unknown in both are returned unchanged.
pub fn t(language: Language, key: &str) -> String {
    lookup(language, key)
        .or_else(|| lookup(Language::En, key))
        .unwrap_or(key)
        .to_string()
}

/// Like [`t`], replacing `{name}` placeholders found in `values`.
/// Placeholders without a value are left in place.
pub fn t_with(language: Language, key: &str, values: &HashMap<&str, String>) -> String {
    let template = t(language, key);
    let mut out = String::with_capacity(template.len());
    let mut rest = template.as_str();

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                let is_word = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
                match values.get(name).filter(|_| is_word) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[open..open + close + 2]),
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanish_falls_back_to_english_then_to_the_key() {
        assert_eq!(t(Language::Es, "common.save"), "Guardar");
        assert_eq!(t(Language::Es, "common.selected"), "{count} selected");
        assert_eq!(t(Language::En, "nope.missing"), "nope.missing");
    }

    #[test]
    fn substitutes_known_placeholders_only() {
        let mut values = HashMap::new();
        values.insert("count", "3".to_string());
        assert_eq!(t_with(Language::En, "common.selected", &values), "3 selected");
        assert_eq!(t_with(Language::En, "common.selected", &HashMap::new()), "{count} selected");
    }
}
