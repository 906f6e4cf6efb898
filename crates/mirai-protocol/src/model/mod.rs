//! Data models for the mirai-api-http protocol.
//!
//! This module contains every structure that travels over the socket:
//! contacts, message segments and chains, pushed events and the request and
//! response payloads of the bot API.

pub mod api;
pub mod event;
pub mod message;
pub mod segment;
pub mod types;

pub use api::*;
pub use event::*;
pub use message::MessageChain;
pub use segment::{
    AppData, AtData, DiceData, FaceData, FileData, ForwardData, ForwardNode, ImageData,
    JsonData, MarketFaceData, MessageRef, MiraiCodeData, MusicShareData, PlainData, PokeData,
    PokeName, QuoteData, SingleMessage, SourceData, VoiceData, XmlData,
};
pub use types::{Friend, Group, HonorAction, Kind, Member, OtherClient, Perm, Profile, Sex};
