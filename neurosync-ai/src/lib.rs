//! neurosync-ai: provider clients, failover with circuit breaking, and plan enrichment.

pub mod assembler;
pub mod breaker;
pub mod cache;
pub mod clock;
pub mod config;
pub mod gateway;
pub mod prompts;
pub mod provider;

pub use assembler::{AssemblyError, EnrichmentConfig, EnrichmentRequest, PlanAssembler};
pub use breaker::{Admission, BreakerConfig, CircuitBreaker, CircuitState};
pub use cache::ResponseCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AiConfig, CacheConfig};
pub use gateway::{
    Attempt, AttemptOutcome, FailoverGateway, GatewayCompletion, GatewayConfig, GatewayError,
};
pub use provider::{
    CompletionBackend, ProviderClient, ProviderFailure, ProviderKind, ProviderPayload,
    ProviderRequest, ProviderSpec, ResponseShape,
};
