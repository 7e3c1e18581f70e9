pub(crate) mod assets;
pub(crate) mod export;
pub(crate) mod layout;
pub(crate) mod raster;
pub(crate) mod text;
