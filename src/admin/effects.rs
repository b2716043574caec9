use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// Something the console should do after an operation: show a
/// notification or move to another page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Toast(Toast),
    Navigate { to: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Effects(Vec<Effect>);

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, message: impl Into<String>) -> &mut Self {
        self.0.push(Effect::Toast(Toast {
            level: ToastLevel::Success,
            message: message.into(),
        }));
        self
    }

    pub fn error(&mut self, message: impl Into<String>) -> &mut Self {
        self.0.push(Effect::Toast(Toast {
            level: ToastLevel::Error,
            message: message.into(),
        }));
        self
    }

    pub fn navigate(&mut self, to: impl Into<String>) -> &mut Self {
        self.0.push(Effect::Navigate { to: to.into() });
        self
    }

    pub fn extend(&mut self, other: Effects) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.0.iter()
    }

    pub fn toasts(&self) -> Vec<&Toast> {
        self.0
            .iter()
            .filter_map(|e| match e {
                Effect::Toast(t) => Some(t),
                Effect::Navigate { .. } => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.toasts()
            .into_iter()
            .filter(|t| t.level == ToastLevel::Error)
            .map(|t| t.message.as_str())
            .collect()
    }

    /// Last navigation wins, the same way a router would apply them.
    pub fn navigation(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|e| match e {
            Effect::Navigate { to } => Some(to.as_str()),
            Effect::Toast(_) => None,
        })
    }
}

impl From<Vec<Effect>> for Effects {
    fn from(effects: Vec<Effect>) -> Self {
        Self(effects)
    }
}
