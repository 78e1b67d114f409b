//! Hook and action descriptors.

/// What the platform is asking the charm to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    name: String,
    action: bool,
    relation_id: Option<String>,
    remote_unit: Option<String>,
    remote_app: Option<String>,
}

impl Hook {
    /// Lifecycle or relation hook, e.g. `config-changed`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), action: false, relation_id: None, remote_unit: None, remote_app: None }
    }

    /// Action, e.g. `backup`.
    pub fn action(name: impl Into<String>) -> Self {
        Self { action: true, ..Self::new(name) }
    }

    /// Relation the hook fires for.
    pub fn with_relation(mut self, relation_id: impl Into<String>) -> Self {
        self.relation_id = Some(relation_id.into());
        self
    }

    /// Remote unit the hook fires for. Also sets the remote application
    /// when none was given.
    pub fn with_remote_unit(mut self, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        if self.remote_app.is_none()
            && let Some((app, _)) = unit.split_once('/')
        {
            self.remote_app = Some(app.to_string());
        }
        self.remote_unit = Some(unit);
        self
    }

    /// Remote application the hook fires for.
    pub fn with_remote_app(mut self, app: impl Into<String>) -> Self {
        self.remote_app = Some(app.into());
        self
    }

    /// Hook or action name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is an action.
    pub fn is_action(&self) -> bool {
        self.action
    }

    /// Relation id, if any.
    pub fn relation_id(&self) -> Option<&str> {
        self.relation_id.as_deref()
    }

    /// Remote unit, if any.
    pub fn remote_unit(&self) -> Option<&str> {
        self.remote_unit.as_deref()
    }

    /// Remote application, if any.
    pub fn remote_app(&self) -> Option<&str> {
        self.remote_app.as_deref()
    }

    /// `hooks/<name>` or `actions/<name>`.
    pub fn dispatch_path(&self) -> String {
        let dir = if self.action { "actions" } else { "hooks" };
        format!("{dir}/{}", self.name)
    }
}

impl From<&str> for Hook {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_unit_implies_app() {
        let hook = Hook::new("db-relation-changed").with_relation("db:0").with_remote_unit("pg/1");

        assert_eq!(hook.remote_app(), Some("pg"));
        assert_eq!(hook.dispatch_path(), "hooks/db-relation-changed");
        assert_eq!(Hook::action("backup").dispatch_path(), "actions/backup");
    }
}
