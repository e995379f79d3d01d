//! Configuration file module

use std::{fs::File, io, path::Path};

use blkgate_proto::{
    types::{Media, Mode},
    Connection,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Device identifier the guest sees (e.g. "51712")
    pub virtual_device: String,

    pub backend: EndpointConfig,
    pub frontend: EndpointConfig,

    /// Access mode granted to the frontend ("r" or "w")
    pub mode: Mode,

    /// Kind of medium exposed ("cdrom" or "disk")
    pub media: Media,

    pub removable: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Store path of the endpoint's subtree
    pub path: String,

    /// Domain the endpoint runs in
    pub domid: u32,
}

impl Config {
    /// Loads a configuration file from disk
    ///
    /// ### Arguments
    /// * `path` - Path to the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let f = File::open(path)?;
        let cfg: Config =
            serde_yaml::from_reader(f).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(cfg)
    }

    /// Builds the connection record this configuration describes
    pub fn connection(&self) -> Connection {
        Connection {
            virtual_device: self.virtual_device.clone(),
            backend_path: self.backend.path.clone(),
            backend_domid: self.backend.domid,
            frontend_path: self.frontend.path.clone(),
            frontend_domid: self.frontend.domid,
            mode: self.mode,
            media: self.media,
            removable: self.removable,
        }
    }
}
