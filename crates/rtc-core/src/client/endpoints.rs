//! URL and form construction for the service endpoints.

use crate::config::ServerConfig;
use urlencoding::encode;

const WEB_UI_INITIALIZER: &str =
    "com.ibm.team.repository.service.internal.webuiInitializer.IWebUIInitializerRestService";
const QUERY_SERVICE: &str = "com.ibm.team.workitem.common.internal.rest.IQueryRestService";
const WORK_ITEM_SERVICE: &str = "com.ibm.team.workitem.common.internal.rest.IWorkItemRestService";
const PROCESS_SERVICE: &str = "com.ibm.team.process.internal.service.web.IProcessWebUIService";

const UPDATE_BACKLINKS: &str = "com.ibm.team.workitem.common.internal.updateBacklinks";

/// Lookup tables requested from `allValues`.
const LOOKUP_TABLES: [&str; 12] = [
    "workItemType",
    "internalSeverity",
    "foundIn",
    "creator",
    "category",
    "internalTags",
    "internalPriority",
    "owner",
    "target",
    "task",
    "key-component",
    "environment",
];

pub(crate) const SEARCH_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub(crate) struct Endpoints {
    service: String,
    project_area: String,
    process_area: String,
    all_values_item: String,
}

impl Endpoints {
    pub(crate) fn new(server: &ServerConfig) -> Self {
        Self {
            service: format!("{}/service", server.base_url.trim_end_matches('/')),
            project_area: server.project_area_id.clone(),
            process_area: server.process_area_uuid.clone(),
            all_values_item: server.all_values_item_id.clone(),
        }
    }

    pub(crate) fn project_area(&self) -> &str {
        &self.project_area
    }

    /// Resolve a developer-supplied URL; relative paths hang off the service root.
    pub(crate) fn absolute(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.service, url.trim_start_matches('/'))
        }
    }

    pub(crate) fn login_check(&self, user: &str, password: &str) -> String {
        format!(
            "{}/{WEB_UI_INITIALIZER}/j_security_check?j_username={}&j_password={}",
            self.service,
            encode(user),
            encode(password)
        )
    }

    pub(crate) fn initializer(&self) -> String {
        format!("{}/{WEB_UI_INITIALIZER}/", self.service)
    }

    pub(crate) fn result_set(&self) -> String {
        format!("{}/{QUERY_SERVICE}/getResultSet", self.service)
    }

    pub(crate) fn search(&self, text: &str) -> String {
        format!(
            "{}/{QUERY_SERVICE}/results?maxResults={SEARCH_LIMIT}&fullText={}&projectAreaItemId={}",
            self.service,
            encode(text),
            self.project_area
        )
    }

    pub(crate) fn retrieve(&self, id: &str) -> String {
        format!(
            "{}/{QUERY_SERVICE}/results?id={}&scopeToProject=false&projectAreaItemId={}",
            self.service,
            encode(id),
            self.project_area
        )
    }

    pub(crate) fn detail(&self, id: &str) -> String {
        format!(
            "{}/{WORK_ITEM_SERVICE}/workItemDTO2?includeHistory=false&id={}&projectAreaItemId={}",
            self.service,
            encode(id),
            self.project_area
        )
    }

    pub(crate) fn allocate(&self, kind: &str) -> String {
        format!(
            "{}/{WORK_ITEM_SERVICE}/workItemDTO2?includeHistory=false&newWorkItem=true&typeId={}&projectAreaItemId={}",
            self.service,
            encode(kind),
            self.project_area
        )
    }

    pub(crate) fn save(&self) -> String {
        format!("{}/{WORK_ITEM_SERVICE}/workItem2", self.service)
    }

    pub(crate) fn iterations(&self) -> String {
        format!(
            "{}/{PROCESS_SERVICE}/iterations?uuid={}",
            self.service, self.process_area
        )
    }

    pub(crate) fn all_values(&self) -> String {
        let ids: String = LOOKUP_TABLES.iter().map(|id| format!("&ids={id}")).collect();
        format!(
            "{}/{WORK_ITEM_SERVICE}/allValues?projectAreaItemId={}&typeId=task&includeArchived=false{ids}&itemId={}",
            self.service, self.project_area, self.all_values_item
        )
    }
}

/// Form body for a `workItem2` save.
#[derive(Debug, Clone, Default)]
pub(crate) struct SaveForm {
    fields: Vec<(&'static str, String)>,
}

impl SaveForm {
    pub(crate) fn new(item_id: &str) -> Self {
        let mut form = Self::default();
        form.push("itemId", item_id);
        form.push("type", "task");
        form
    }

    pub(crate) fn state(mut self, state_id: &str) -> Self {
        self.push("stateId", state_id);
        self
    }

    /// One attribute assignment; pairs are matched by position on the server.
    pub(crate) fn attribute(mut self, key: &str, value: &str) -> Self {
        self.push("attributeIdentifiers", key);
        self.push("attributeValues", value);
        self
    }

    pub(crate) fn action(mut self, action: &str) -> Self {
        self.push("action", action);
        self
    }

    pub(crate) fn update_links(mut self, command: &str) -> Self {
        self.push("updateLinks", command);
        self
    }

    pub(crate) fn finish(mut self, project_area: &str) -> String {
        self.push("additionalSaveParameters", UPDATE_BACKLINKS);
        self.push("sanitizeHTML", "true");
        self.push("projectAreaItemId", project_area);
        self.fields
            .iter()
            .map(|(name, value)| format!("{name}={}", encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn push(&mut self, name: &'static str, value: &str) {
        self.fields.push((name, value.to_string()));
    }
}
