//! Wire types shared by every mesh participant.
//!
//! Messages are plain prost structs and the `Mailbox` service is generated
//! in `build.rs` without a `.proto` file, so building needs no `protoc`.

/// One point-to-point message between two ranks.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Envelope {
    /// Rank of the sender.
    #[prost(uint32, tag = "1")]
    pub source: u32,
    /// Channel identifier used to match the receive.
    #[prost(uint32, tag = "2")]
    pub tag: u32,
    #[prost(sint64, repeated, tag = "3")]
    pub payload: Vec<i64>,
}

/// Returned once an envelope sits in the destination mailbox.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Ack {}

pub mod mailbox {
    include!(concat!(env!("OUT_DIR"), "/mesh.Mailbox.rs"));
}
