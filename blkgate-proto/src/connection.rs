//! Initial store wiring for a new frontend/backend pair
//!
//! A [`Connection`] describes one block channel; [`Connection::initial_writes`]
//! flattens it into the `(domid, path, value)` nodes the toolstack must
//! create before either endpoint starts its handshake.

use serde::{Deserialize, Serialize};

use crate::{
    handshake::KEY_STATE,
    types::{Media, Mode, State},
};

/// Everything needed to wire a frontend to a backend through the store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Device identifier the guest sees (e.g. "51712")
    pub virtual_device: String,

    /// Store path of the backend's subtree
    pub backend_path: String,

    /// Domain that runs the backend
    pub backend_domid: u32,

    /// Store path of the frontend's subtree
    pub frontend_path: String,

    /// Domain that runs the frontend
    pub frontend_domid: u32,

    pub mode: Mode,
    pub media: Media,
    pub removable: bool,
}

impl Connection {
    /// Flattens the connection into the store nodes to create
    ///
    /// Both endpoints start in [`State::Initialising`]. The order of child
    /// writes within a node carries no meaning; the peer observes the
    /// completed set.
    pub fn initial_writes(&self) -> Vec<(u32, String, String)> {
        let child = |path: &str, key: &str| format!("{}/{}", path, key);
        let removable = match self.removable {
            true => "1",
            false => "0",
        };

        vec![
            // empty parent nodes first so the children have somewhere to live
            (self.backend_domid, self.backend_path.clone(), String::new()),
            (
                self.frontend_domid,
                self.frontend_path.clone(),
                String::new(),
            ),
            (
                self.backend_domid,
                child(&self.backend_path, "frontend"),
                self.frontend_path.clone(),
            ),
            (
                self.backend_domid,
                child(&self.backend_path, "frontend-id"),
                self.frontend_domid.to_string(),
            ),
            (
                self.backend_domid,
                child(&self.backend_path, "online"),
                "1".to_string(),
            ),
            (
                self.backend_domid,
                child(&self.backend_path, "removable"),
                removable.to_string(),
            ),
            (
                self.backend_domid,
                child(&self.backend_path, KEY_STATE),
                State::Initialising.as_str().to_string(),
            ),
            (
                self.backend_domid,
                child(&self.backend_path, "mode"),
                self.mode.as_str().to_string(),
            ),
            (
                self.frontend_domid,
                child(&self.frontend_path, "backend"),
                self.backend_path.clone(),
            ),
            (
                self.frontend_domid,
                child(&self.frontend_path, "backend-id"),
                self.backend_domid.to_string(),
            ),
            (
                self.frontend_domid,
                child(&self.frontend_path, KEY_STATE),
                State::Initialising.as_str().to_string(),
            ),
            (
                self.frontend_domid,
                child(&self.frontend_path, "virtual-device"),
                self.virtual_device.clone(),
            ),
            (
                self.frontend_domid,
                child(&self.frontend_path, "device-type"),
                self.media.as_str().to_string(),
            ),
        ]
    }
}
