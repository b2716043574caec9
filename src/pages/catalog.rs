use serde_json::json;

use crate::admin::{
    CellFormat, ColumnDef, FieldConfig, FilterConfig, FormConfig, FormMode, InlineConfig, ParentLink,
    TabConfig, select_options,
};
use crate::error::AppError;

const CAMPUSES: &[(&str, &str)] = &[
    ("Segovia", "Segovia"),
    ("Madrid A", "Madrid IE Tower"),
    ("Madrid B", "Madrid Maria de Molina"),
];

const PROFESSOR_TYPES: &[(&str, &str)] = &[
    ("f", "Faculty"),
    ("a", "Adjunct Professor"),
    ("v", "Visiting Professor"),
];

const COURSE_TYPES: &[(&str, &str)] = &[
    ("BA", "Basic"),
    ("OB", "Obligatory"),
    ("OP", "Optional"),
    ("CA", "Complementary Activity"),
    ("EL", "Electives"),
    ("RE", "Regular"),
    ("OACT", "Other Activities"),
];

const SCHOOLS: &[(&str, &str)] = &[
    ("business", "Business School"),
    ("law", "Law School"),
    ("sci_and_tech", "Science and Technology School"),
    ("humanities", "School of Humanities"),
    ("econ_glo_affa", "Politics, Economics and Global Affairs School"),
    ("arch", "School of Architecture and Design"),
];

const PROGRAM_TYPES: &[(&str, &str)] = &[("ba", "Bachelors"), ("ma", "Master")];
const GENDERS: &[(&str, &str)] = &[("H", "Male"), ("M", "Female")];
const SEMESTERS: &[(&str, &str)] = &[("fall", "Fall"), ("spring", "Spring")];
const SECTION_NAMES: &[(&str, &str)] = &[("A", "Section A"), ("B", "Section B")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Professors,
    Courses,
    Programs,
    /// Backend `intakes`.
    Terms,
    /// Backend `joined-academic-years`, shown as "Intakes".
    AcademicYears,
    Sections,
    CourseDeliveries,
}

/// Static description of one managed entity.
#[derive(Debug, Clone)]
pub struct ResourceDef {
    pub resource: Resource,
    pub endpoint: &'static str,
    pub base_path: &'static str,
    pub title: &'static str,
    pub entity_name: &'static str,
    pub plural: &'static str,
    pub ordering: Option<&'static str>,
    pub columns: Vec<ColumnDef>,
    pub filters: Vec<FilterConfig>,
    pub export_fields: Vec<String>,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Professors,
        Resource::Courses,
        Resource::Programs,
        Resource::Terms,
        Resource::AcademicYears,
        Resource::Sections,
        Resource::CourseDeliveries,
    ];

    pub fn from_slug(slug: &str) -> Result<Self, AppError> {
        match slug {
            "professors" => Ok(Resource::Professors),
            "courses" => Ok(Resource::Courses),
            "programs" => Ok(Resource::Programs),
            "terms" => Ok(Resource::Terms),
            "intakes" | "academic-years" => Ok(Resource::AcademicYears),
            "sections" => Ok(Resource::Sections),
            "course-deliveries" => Ok(Resource::CourseDeliveries),
            _ => Err(AppError::NotFound),
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Resource::Professors => "professors",
            Resource::Courses => "courses",
            Resource::Programs => "programs",
            Resource::Terms => "terms",
            Resource::AcademicYears => "intakes",
            Resource::Sections => "sections",
            Resource::CourseDeliveries => "course-deliveries",
        }
    }

    pub fn definition(self) -> ResourceDef {
        match self {
            Resource::Professors => ResourceDef {
                resource: self,
                endpoint: "professors",
                base_path: "/professors",
                title: "Professors",
                entity_name: "Professor",
                plural: "Professors",
                ordering: None,
                columns: vec![
                    ColumnDef::plain("name", "Name"),
                    ColumnDef::plain("last_name", "Last Name"),
                    ColumnDef::plain("corporate_email", "Corporate Email"),
                    ColumnDef::plain("professor_type_display", "Professor Type"),
                ],
                filters: vec![
                    FilterConfig::multi("professor_type", "Professor Type", PROFESSOR_TYPES),
                    FilterConfig::multi("campuses", "Campus", CAMPUSES),
                    FilterConfig::single("accredited", "Accredited", &[("true", "Yes"), ("false", "No")]),
                    FilterConfig::single("gender", "Gender", GENDERS),
                    FilterConfig::multi(
                        "joined_year",
                        "Joined Year",
                        &[("2020", "2020"), ("2021", "2021"), ("2022", "2022"), ("2023", "2023"), ("2024", "2024")],
                    ),
                    FilterConfig::multi("availability", "Availability", &[("morning", "Morning"), ("afternoon", "Afternoon")]),
                ],
                export_fields: fields(&[
                    "name",
                    "last_name",
                    "email",
                    "corporate_email",
                    "phone_number",
                    "professor_type",
                    "gender",
                    "birth_year",
                    "joined_year",
                    "accredited",
                    "linkedin_profile",
                ]),
            },
            Resource::Courses => ResourceDef {
                resource: self,
                endpoint: "courses",
                base_path: "/courses",
                title: "Courses",
                entity_name: "Course",
                plural: "Courses",
                ordering: None,
                columns: vec![
                    ColumnDef::plain("name", "Name"),
                    ColumnDef::plain("code", "Code"),
                    ColumnDef::plain("course_type_display", "Course Type"),
                    ColumnDef::plain("credits", "Credits"),
                    ColumnDef::plain("sessions", "Sessions"),
                ],
                filters: vec![
                    FilterConfig::multi("course_type", "Course Type", COURSE_TYPES),
                    FilterConfig::multi("credits", "Credits", &[("3", "3 Credits"), ("6", "6 Credits"), ("9", "9 Credits"), ("12", "12 Credits")]),
                    FilterConfig::multi(
                        "sessions",
                        "Sessions",
                        &[("15", "15 Sessions"), ("30", "30 Sessions"), ("45", "45 Sessions"), ("60", "60 Sessions")],
                    ),
                ],
                export_fields: fields(&["name", "code", "area", "course_type", "credits", "sessions"]),
            },
            Resource::Programs => ResourceDef {
                resource: self,
                endpoint: "programs",
                base_path: "/programs",
                title: "Programs",
                entity_name: "Program",
                plural: "Programs",
                ordering: None,
                columns: vec![
                    ColumnDef::plain("code", "Code"),
                    ColumnDef::plain("name", "Name"),
                    ColumnDef::plain("school", "School"),
                    ColumnDef::plain("type", "Type"),
                    ColumnDef::plain("years", "Years"),
                    ColumnDef::new("academic_director", "Academic Director", CellFormat::FullName),
                ],
                filters: vec![
                    FilterConfig::multi("school", "School", SCHOOLS),
                    FilterConfig::single("type", "Program Type", PROGRAM_TYPES),
                ],
                export_fields: fields(&["name", "code", "school", "type", "years", "academic_director"]),
            },
            Resource::Terms => ResourceDef {
                resource: self,
                endpoint: "intakes",
                base_path: "/terms",
                title: "Terms",
                entity_name: "Term",
                plural: "Terms",
                ordering: Some("-start_time"),
                columns: vec![
                    ColumnDef::plain("name", "Name"),
                    ColumnDef::new("start_time", "Start Date", CellFormat::Date),
                    ColumnDef::new("end_time", "End Date", CellFormat::Date),
                    ColumnDef::plain("semester_display", "Semester"),
                    ColumnDef::new("active", "Active", CellFormat::YesNo),
                ],
                filters: vec![
                    FilterConfig::single("semester", "Semester", SEMESTERS),
                    FilterConfig::single("active", "Status", &[("true", "Active"), ("false", "Inactive")]),
                ],
                export_fields: fields(&["name", "start_time", "end_time", "semester", "active"]),
            },
            Resource::AcademicYears => ResourceDef {
                resource: self,
                endpoint: "joined-academic-years",
                base_path: "/intakes",
                title: "Intakes",
                entity_name: "Intake",
                plural: "Intakes",
                ordering: Some("-start_date"),
                columns: vec![
                    ColumnDef::plain("name", "Name"),
                    ColumnDef::new("start_date", "Start Date", CellFormat::Date),
                ],
                filters: Vec::new(),
                export_fields: fields(&["name", "start_date"]),
            },
            Resource::Sections => ResourceDef {
                resource: self,
                endpoint: "sections",
                base_path: "/sections",
                title: "Sections",
                entity_name: "Section",
                plural: "Sections",
                ordering: Some("-created_at"),
                columns: vec![
                    ColumnDef::plain("name", "Section"),
                    ColumnDef::new("program", "Program", CellFormat::Name),
                    ColumnDef::plain("campus_display", "Campus"),
                    ColumnDef::plain("course_year", "Year"),
                    ColumnDef::new("intake", "Term", CellFormat::Name),
                    ColumnDef::new("joined_academic_year", "Intake", CellFormat::Name),
                ],
                filters: vec![
                    FilterConfig::multi("name", "Section", SECTION_NAMES),
                    FilterConfig::multi("campus", "Campus", CAMPUSES),
                    FilterConfig::multi(
                        "course_year",
                        "Year",
                        &[("1", "Year 1"), ("2", "Year 2"), ("3", "Year 3"), ("4", "Year 4")],
                    ),
                ],
                export_fields: fields(&["name", "campus", "course_year", "program", "intake"]),
            },
            Resource::CourseDeliveries => ResourceDef {
                resource: self,
                endpoint: "course-deliveries",
                base_path: "/course-deliveries",
                title: "Course Deliveries",
                entity_name: "Course Delivery",
                plural: "Course Deliveries",
                ordering: Some("-created_at"),
                columns: vec![
                    ColumnDef::new("course", "Course", CellFormat::Name),
                    ColumnDef::new("professor", "Professor", CellFormat::FullName),
                    ColumnDef::plain("professor.corporate_email", "Professor Email"),
                    ColumnDef::new("sections", "Sections", CellFormat::List),
                    ColumnDef::plain("course.credits", "Credits"),
                    ColumnDef::plain("course.sessions", "Sessions"),
                ],
                filters: vec![
                    FilterConfig::single("course", "Course", &[]),
                    FilterConfig::single("professor", "Professor", &[("null", "Unassigned")])
                        .null_param("professor__isnull"),
                ],
                export_fields: fields(&["course", "professor", "sections"]),
            },
        }
    }

    /// Add forms are flat; edit forms add tabs and inline child tables
    /// where the entity has them.
    pub fn form_config(self, mode: &FormMode) -> FormConfig {
        let def = self.definition();
        let editing = matches!(mode, FormMode::Edit(_));
        let title = if editing {
            format!("Edit {}", def.entity_name)
        } else {
            format!("Add {}", def.entity_name)
        };

        let (fields, tabs, inlines) = match self {
            Resource::Professors => (professor_fields(), professor_tabs(), professor_inlines()),
            Resource::Courses => (
                course_fields(),
                vec![TabConfig::new(
                    "basic",
                    "Course Information",
                    &["code", "name", "course_type", "credits", "sessions", "area"],
                )],
                vec![InlineConfig {
                    key: "deliveries".to_string(),
                    label: "Course Deliveries".to_string(),
                    endpoint: "course-deliveries".to_string(),
                    fields: vec![FieldConfig::foreign_key("professor", "Professor", "professors", "name")],
                    foreign_key_field: "course".to_string(),
                    parent_link: ParentLink::Field("course".to_string()),
                    tab: "basic".to_string(),
                }],
            ),
            Resource::Sections => (
                section_fields(),
                vec![TabConfig::new(
                    "basic",
                    "Section Information",
                    &["name", "campus", "course_year", "intake", "program", "joined_academic_year"],
                )],
                vec![InlineConfig {
                    key: "course_deliveries".to_string(),
                    label: "Course Deliveries".to_string(),
                    endpoint: "course-deliveries".to_string(),
                    fields: vec![
                        FieldConfig::foreign_key("course", "Course", "courses", "name"),
                        FieldConfig::foreign_key("professor", "Professor", "professors", "name"),
                    ],
                    foreign_key_field: "sections".to_string(),
                    parent_link: ParentLink::List("sections".to_string()),
                    tab: "basic".to_string(),
                }],
            ),
            Resource::Programs => (program_fields(), Vec::new(), Vec::new()),
            Resource::Terms => (term_fields(), Vec::new(), Vec::new()),
            Resource::AcademicYears => (
                vec![
                    FieldConfig::text("name", "Name").required(),
                    FieldConfig::date("start_date", "Start Date").required(),
                ],
                Vec::new(),
                Vec::new(),
            ),
            Resource::CourseDeliveries => (
                vec![
                    FieldConfig::foreign_key("course", "Course", "courses", "name").required(),
                    FieldConfig::foreign_key("professor", "Professor", "professors", "name"),
                ],
                Vec::new(),
                Vec::new(),
            ),
        };

        FormConfig {
            title,
            endpoint: def.endpoint.to_string(),
            fields,
            tabs: if editing { tabs } else { Vec::new() },
            inlines: if editing { inlines } else { Vec::new() },
            back_path: def.base_path.to_string(),
            entity_name: def.entity_name.to_string(),
        }
    }
}

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn professor_fields() -> Vec<FieldConfig> {
    vec![
        FieldConfig::text("name", "Name").required(),
        FieldConfig::text("last_name", "Last Name").required(),
        FieldConfig::number("birth_year", "Birth Year"),
        FieldConfig::select("gender", "Gender", select_options(GENDERS)),
        FieldConfig::select("professor_type", "Professor Type", select_options(PROFESSOR_TYPES)),
        FieldConfig::number("joined_year", "Joined Year"),
        FieldConfig::number("minimum_number_of_sessions", "PDP (Required Sessions)").default_value(json!(0)),
        FieldConfig::boolean("accredited", "Accredited").default_value(json!(false)),
        FieldConfig::multi_select("campuses", "Campuses", select_options(CAMPUSES)).default_value(json!([])),
        FieldConfig::multi_select(
            "availabilities",
            "Availabilities",
            select_options(&[("morning", "Morning"), ("afternoon", "Afternoon")]),
        )
        .default_value(json!([])),
        FieldConfig::email("email", "Personal Email").required(),
        FieldConfig::email("corporate_email", "Corporate Email"),
        FieldConfig::text("phone_number", "Phone Number"),
        FieldConfig::text("linkedin_profile", "LinkedIn Profile"),
    ]
}

fn professor_tabs() -> Vec<TabConfig> {
    vec![
        TabConfig::new("personal", "Personal Information", &["name", "last_name", "birth_year", "gender"]),
        TabConfig::new(
            "professional",
            "Professional Information",
            &[
                "professor_type",
                "joined_year",
                "minimum_number_of_sessions",
                "accredited",
                "campuses",
                "availabilities",
            ],
        ),
        TabConfig::new(
            "contact",
            "Contact Information",
            &["email", "corporate_email", "phone_number", "linkedin_profile"],
        ),
    ]
}

fn professor_inlines() -> Vec<InlineConfig> {
    vec![
        InlineConfig {
            key: "degrees".to_string(),
            label: "Degrees".to_string(),
            endpoint: "professor-degrees".to_string(),
            fields: vec![FieldConfig::foreign_key("degree", "Degree", "degrees", "name").write_as("degree_id")],
            foreign_key_field: "professor".to_string(),
            parent_link: ParentLink::Field("professor_id".to_string()),
            tab: "professional".to_string(),
        },
        InlineConfig {
            key: "course_possibilities".to_string(),
            label: "Course Possibilities".to_string(),
            endpoint: "professor-course-possibilities".to_string(),
            fields: vec![FieldConfig::foreign_key("course", "Course", "courses", "name").write_as("course_id")],
            foreign_key_field: "professor".to_string(),
            parent_link: ParentLink::Field("professor_id".to_string()),
            tab: "professional".to_string(),
        },
        InlineConfig {
            key: "active_courses".to_string(),
            label: "Active Courses".to_string(),
            endpoint: "course-deliveries".to_string(),
            fields: vec![FieldConfig::foreign_key("course", "Course", "courses", "name").readonly()],
            foreign_key_field: "professor".to_string(),
            parent_link: ParentLink::Field("professor".to_string()),
            tab: "professional".to_string(),
        },
    ]
}

fn course_fields() -> Vec<FieldConfig> {
    vec![
        FieldConfig::text("code", "Course Code").required(),
        FieldConfig::text("name", "Course Name").required(),
        FieldConfig::select("course_type", "Course Type", select_options(COURSE_TYPES)),
        FieldConfig::number("credits", "Credits").required(),
        FieldConfig::number("sessions", "Sessions").required(),
        FieldConfig::foreign_key("area", "Area", "areas", "name").write_as("area_id"),
    ]
}

fn section_fields() -> Vec<FieldConfig> {
    vec![
        FieldConfig::select("name", "Section Name", select_options(SECTION_NAMES)).required(),
        FieldConfig::select("campus", "Campus", select_options(CAMPUSES)).required(),
        FieldConfig::number("course_year", "Course Year")
            .required()
            .default_value(json!(1)),
        FieldConfig::foreign_key("intake", "Term", "intakes", "name").write_as("intake_id"),
        FieldConfig::foreign_key("program", "Program", "programs", "name").write_as("program_id"),
        FieldConfig::foreign_key("joined_academic_year", "Intake", "joined-academic-years", "name")
            .write_as("joined_academic_year_id"),
    ]
}

fn program_fields() -> Vec<FieldConfig> {
    vec![
        FieldConfig::text("name", "Program Name").required(),
        FieldConfig::text("code", "Program Code").required(),
        FieldConfig::select("school", "School", select_options(SCHOOLS)),
        FieldConfig::select("type", "Program Type", select_options(PROGRAM_TYPES)),
        FieldConfig::number("years", "Years").default_value(json!(4)),
        FieldConfig::foreign_key("academic_director", "Academic Director", "auth/users", "username")
            .write_as("academic_director_id"),
    ]
}

fn term_fields() -> Vec<FieldConfig> {
    vec![
        FieldConfig::text("name", "Name").required(),
        FieldConfig::date("start_time", "Start Date").required(),
        FieldConfig::date("end_time", "End Date").required(),
        FieldConfig::select("semester", "Semester", select_options(SEMESTERS)),
        FieldConfig::boolean("active", "Active").default_value(json!(true)),
    ]
}
