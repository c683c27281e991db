//! Session document types.

use crate::consortium::Consortium;
use crate::dialog::DialogStep;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One session document per chat scope.
///
/// Holds every consortium created in that chat plus any pending creation
/// dialogs, keyed by the initiating user's id. Both maps default to empty so
/// documents written by older versions still deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Consortiums by generated identifier; ids are never reused or deleted
    #[serde(default)]
    pub consortiums: HashMap<String, Consortium>,
    /// Pending creation dialogs by user id
    #[serde(default)]
    pub dialogs: HashMap<String, DialogStep>,
}

impl SessionData {
    /// Key used for the `dialogs` map.
    pub fn dialog_key(user_id: i64) -> String {
        user_id.to_string()
    }
}
