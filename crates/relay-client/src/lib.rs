//! Client side of the framed streaming protocol
//!
//! Bytes of a `text/stream` response arrive in arbitrary fragments. The
//! [`FrameDecoder`] extracts complete frames from the text received so far,
//! the [`TargetRouter`] applies them to a [`Dom`], and [`ChatPage`] ties both
//! together for every open request.

pub mod decoder;
pub mod dom;
pub mod http;
pub mod page;
pub mod router;

pub use decoder::{DecodedFrame, FrameDecoder};
pub use dom::{Dom, MemoryDom, html_to_text};
pub use http::HttpStreamClient;
pub use page::{ChatPage, PageEvent, StreamHandle};
pub use router::{RouteOutcome, TargetRouter};
