use serde::Serialize;
use tracing::debug;

use crate::address::{self, Address, EncodeOptions};
use crate::error::LinkError;
use crate::remote::select_remote;
use crate::repo::{CONFIG_NAMESPACE, OVERRIDE_TEMPLATE_KEY, PREFERRED_REMOTE_KEY, RepoFacts};
use crate::resolver::{RemoteUrlPattern, resolve_url};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationTarget {
    pub repository: String,
    pub revision: String,
    pub file_path: String,
    pub search_option: Option<String>,
}

impl From<Address> for NavigationTarget {
    fn from(value: Address) -> Self {
        Self {
            repository: value.repository,
            revision: value.revision,
            file_path: value.file_path,
            search_option: value.search_option,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedLink {
    pub address: String,
    /// `None` when an override template made remote selection unnecessary.
    pub remote: Option<String>,
    pub url: String,
    pub description: Option<String>,
}

pub fn store_address(
    repository: &str,
    revision: &str,
    file_path: &str,
    options: EncodeOptions,
) -> Result<String, LinkError> {
    let raw = [repository, revision, file_path].join(address::DELIMITER);
    address::encode(repository, revision, file_path, options)
        .map_err(|error| LinkError::broken(&raw, error))
}

pub fn navigate(raw_address: &str) -> Result<NavigationTarget, LinkError> {
    address::decode(raw_address)
        .map(NavigationTarget::from)
        .map_err(|error| LinkError::broken(raw_address, error))
}

/// Resolves a stored address into a web URL using `facts` for the
/// repository the address names.
pub fn export_link<F: RepoFacts + ?Sized>(
    raw_address: &str,
    description: Option<&str>,
    facts: &F,
    table: &[RemoteUrlPattern],
) -> Result<ExportedLink, LinkError> {
    let decoded =
        address::decode(raw_address).map_err(|error| LinkError::broken(raw_address, error))?;

    let override_template = facts.get_config(CONFIG_NAMESPACE, OVERRIDE_TEMPLATE_KEY)?;
    let (remote, remote_url) = if override_template.is_some() {
        (None, None)
    } else {
        let remotes = facts.list_remotes()?;
        let preferred = facts.get_config(CONFIG_NAMESPACE, PREFERRED_REMOTE_KEY)?;
        let remote = select_remote(&remotes, preferred.as_deref())
            .map_err(|error| LinkError::broken(raw_address, error))?;
        let remote_url = facts.get_remote_url(&remote)?;
        debug!(remote = %remote, remote_url = ?remote_url, "remote selected for export");
        (Some(remote), remote_url)
    };

    let url = resolve_url(
        &decoded.revision,
        &decoded.file_path,
        override_template.as_deref(),
        remote_url.as_deref(),
        table,
    )
    .map_err(|error| LinkError::broken(raw_address, error))?;

    Ok(ExportedLink {
        address: raw_address.to_string(),
        remote,
        url,
        description: description
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .map(str::to_string),
    })
}
