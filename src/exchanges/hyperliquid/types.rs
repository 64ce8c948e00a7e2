use serde::Serialize;

/// Request bodies for the `/info` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InfoRequest {
    PerpDexs,
    ClearinghouseState {
        user: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        dex: Option<String>,
    },
    FrontendOpenOrders {
        user: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        dex: Option<String>,
    },
}

/// A perpetuals deployment. The default dex has an empty name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PerpDex {
    pub name: String,
}

impl PerpDex {
    pub fn default_dex() -> Self {
        Self {
            name: String::new(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }

    /// Value for the `dex` request field; omitted for the default dex.
    pub fn request_name(&self) -> Option<String> {
        (!self.is_default()).then(|| self.name.clone())
    }
}
