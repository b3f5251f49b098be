//! # NetSeg Domain Layer
//!
//! This crate contains the segment CRUD contract for NetSeg: network segment
//! records binding a network to a physical network, a segmentation type and a
//! segmentation id. It follows hexagonal architecture principles:
//!
//! - **Entities**: Core domain models (Segment, SegmentView)
//! - **Ports**: Trait definitions for external dependencies (SegmentStore,
//!   MarkerResolver, IdGenerator)
//! - **Services**: Orchestration (SegmentManager)
//!
//! ## Architecture
//!
//! This layer has NO storage engine of its own. Persistence, transactions and
//! marker lookup are expressed as traits (ports) implemented by adapter crates.
//!
//! ## Example
//!
//! ```rust
//! use netseg_domain::ports::{MarkerResolver, SegmentStore};
//! use netseg_domain::segment::{NetworkId, SegmentManager, SegmentSpec};
//! use netseg_domain::RequestContext;
//!
//! // The manager is generic over any adapter implementing the ports
//! async fn example<S: SegmentStore, P: MarkerResolver>(
//!     manager: SegmentManager<S, P>,
//!     network_id: NetworkId,
//! ) {
//!     let ctx = RequestContext::new();
//!     let spec = SegmentSpec::new(network_id, "vlan").with_segmentation_id(100);
//!     let view = manager.create(&ctx, spec).await.unwrap();
//!     println!("Created segment: {:?}", view.id());
//! }
//! ```

pub mod context;
pub mod ports;
pub mod segment;
pub mod transaction;

// Re-export commonly used types
pub use context::{RequestContext, SessionId};
pub use ports::{IdGenerator, MarkerResolver, SegmentStore, Transactional, UuidGenerator};
pub use segment::{Segment, SegmentError, SegmentId, SegmentManager, SegmentView};
pub use transaction::TransactionScope;
