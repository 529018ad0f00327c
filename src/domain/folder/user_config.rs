//! Folder user configuration module.
//!
//! This module contains the access to the user configuration objects
//! stored on a folder, addressed by name.

use log::{debug, info};

use crate::{Folder, Root, UserConfiguration, UserConfigurationProperties};

use super::Result;

impl Folder {
    pub fn get_user_configuration(
        &self,
        root: &Root,
        name: &str,
        properties: UserConfigurationProperties,
    ) -> Result<UserConfiguration> {
        self.require_id()?;
        info!("getting user configuration {} of folder {}", name, self);
        debug!("user configuration properties: {:?}", properties);

        let id = self.to_folder_id(root.account())?;
        Ok(root
            .service()
            .get_user_configuration(&id, name, properties)?)
    }

    pub fn create_user_configuration(&self, root: &Root, config: &UserConfiguration) -> Result<()> {
        self.require_id()?;
        info!("creating user configuration {} in folder {}", config.name, self);

        let id = self.to_folder_id(root.account())?;
        Ok(root.service().create_user_configuration(&id, config)?)
    }

    pub fn update_user_configuration(&self, root: &Root, config: &UserConfiguration) -> Result<()> {
        self.require_id()?;
        info!("updating user configuration {} of folder {}", config.name, self);

        let id = self.to_folder_id(root.account())?;
        Ok(root.service().update_user_configuration(&id, config)?)
    }

    pub fn delete_user_configuration(&self, root: &Root, name: &str) -> Result<()> {
        self.require_id()?;
        info!("deleting user configuration {} of folder {}", name, self);

        let id = self.to_folder_id(root.account())?;
        Ok(root.service().delete_user_configuration(&id, name)?)
    }
}
