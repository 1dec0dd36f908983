// Service exports
pub mod marketplace;
pub mod proxy;
pub mod transport;

pub use marketplace::MarketplaceClient;
pub use proxy::{MarketplaceProxy, ProxyError, SearchParams};
pub use transport::{ReqwestTransport, TransportError, UpstreamRequest, UpstreamResponse, UpstreamTransport};
