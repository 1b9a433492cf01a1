pub mod catalog_services;
pub mod playlist_services;
pub mod portal_services;
pub mod proxy_services;
pub mod session_services;
pub mod stream_services;

pub use portal_services::DynPortalClient;
pub use proxy_services::ProxyServices;
