
// suppliers
mod myflixer;

pub use myflixer::MyFlixerContentSupplier;

use std::str::FromStr;

use enum_dispatch::enum_dispatch;
use strum::VariantNames;
use strum_macros::{EnumIter, EnumString, VariantNames};

use crate::{
    config::Config,
    errors::{Error, Result},
    models::{
        CatalogDescriptor, CatalogExtra, ContentIdentifier, ContentType, MetaDetail, MetaPreview,
        StreamDescriptor,
    },
    utils::UpstreamClient,
};

/// Shared state handed to every supplier call.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub client: UpstreamClient,
}

impl Context {
    pub fn new(config: Config) -> Result<Self> {
        let client = UpstreamClient::new(config.request_timeout)?;
        Ok(Self { config, client })
    }
}

#[allow(async_fn_in_trait)]
#[enum_dispatch]
pub trait ContentSupplier {
    fn get_supported_types(&self) -> Vec<ContentType>;
    fn get_catalogs(&self) -> Vec<CatalogDescriptor>;
    async fn load_catalog(
        &self,
        ctx: &Context,
        content_type: ContentType,
        extra: &CatalogExtra,
    ) -> anyhow::Result<Vec<MetaPreview>>;
    async fn load_meta(
        &self,
        ctx: &Context,
        id: &ContentIdentifier,
    ) -> anyhow::Result<MetaDetail>;
    async fn load_streams(
        &self,
        ctx: &Context,
        id: &ContentIdentifier,
    ) -> anyhow::Result<Vec<StreamDescriptor>>;
}

#[enum_dispatch(ContentSupplier)]
#[derive(EnumIter, EnumString, VariantNames)]
pub enum AllContentSuppliers {
    #[strum(serialize = "myflixer")]
    MyFlixerContentSupplier,
}

pub fn available_suppliers() -> Vec<String> {
    AllContentSuppliers::VARIANTS
        .iter()
        .map(|&s| s.to_owned())
        .collect()
}

pub fn get_supplier(name: &str) -> Result<AllContentSuppliers> {
    AllContentSuppliers::from_str(name).map_err(|_| Error::UnknownSupplier(name.to_owned()))
}
