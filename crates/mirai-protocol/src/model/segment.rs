//! Message segment types.
//!
//! A segment is one element of a message chain: a piece of text, an @, an
//! image and so on. On the wire every segment is an object whose `type`
//! field names its kind; [`SingleMessage`] is internally tagged on that
//! field, so a serialized segment always carries the right tag.
//!
//! # Example
//!
//! ```rust,ignore
//! use mirai_protocol::SingleMessage;
//!
//! let text = SingleMessage::plain("Hello, ");
//! let at = SingleMessage::at(10001000);
//! let face = SingleMessage::face(178);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::MessageChain;

// ============================================================================
// SingleMessage Enum
// ============================================================================

/// One message segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SingleMessage {
    /// Message metadata. Always the first element of a received chain.
    Source(SourceData),
    /// Quote reply.
    Quote(QuoteData),
    /// @ a group member.
    At(AtData),
    /// @ everyone.
    AtAll,
    /// QQ face.
    Face(FaceData),
    /// Plain text.
    Plain(PlainData),
    /// Image.
    Image(ImageData),
    /// Flash image. Same parameters as [`SingleMessage::Image`].
    FlashImage(ImageData),
    /// Voice clip.
    Voice(VoiceData),
    /// XML card.
    Xml(XmlData),
    /// JSON card.
    Json(JsonData),
    /// App card.
    App(AppData),
    /// Poke.
    Poke(PokeData),
    /// Dice.
    Dice(DiceData),
    /// Market face (receive and forward only).
    MarketFace(MarketFaceData),
    /// Music share card.
    MusicShare(MusicShareData),
    /// Forwarded message bundle.
    Forward(ForwardData),
    /// Group file.
    File(FileData),
    /// Mirai code text.
    MiraiCode(MiraiCodeData),
}

impl fmt::Display for SingleMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingleMessage::Source(_) => Ok(()),
            SingleMessage::Quote(_) => write!(f, "[引用]"),
            SingleMessage::At(data) => write!(f, "@{}", data.target),
            SingleMessage::AtAll => write!(f, "@全体成员"),
            SingleMessage::Face(data) => match (&data.name, data.face_id) {
                (Some(name), _) if !name.is_empty() => write!(f, "[{name}]"),
                (_, Some(id)) if id != 0 => write!(f, "[表情:{id}]"),
                _ => write!(f, "[表情]"),
            },
            SingleMessage::Plain(data) => write!(f, "{}", data.text),
            SingleMessage::Image(_) => write!(f, "[图片]"),
            SingleMessage::FlashImage(_) => write!(f, "[闪照]"),
            SingleMessage::Voice(_) => write!(f, "[语音消息]"),
            SingleMessage::Xml(data) => write!(f, "{}", data.xml),
            SingleMessage::Json(data) => write!(f, "{}", data.json),
            SingleMessage::App(data) => write!(f, "{}", data.content),
            SingleMessage::Poke(_) => write!(f, "[戳一戳]"),
            SingleMessage::Dice(data) => write!(f, "[骰子:{}]", data.value),
            SingleMessage::MarketFace(data) => {
                if !data.name.is_empty() {
                    write!(f, "[{}]", data.name)
                } else if data.id != 0 {
                    write!(f, "[商城表情:{}]", data.id)
                } else {
                    write!(f, "[商城表情]")
                }
            }
            SingleMessage::MusicShare(data) => write!(f, "[分享]{}", data.title),
            SingleMessage::Forward(_) => write!(f, "[转发消息]"),
            SingleMessage::File(data) => write!(f, "[文件]{}", data.name),
            SingleMessage::MiraiCode(data) => write!(f, "{}", data.code),
        }
    }
}

impl SingleMessage {
    /// The wire `type` tag of this segment.
    pub fn type_tag(&self) -> &'static str {
        match self {
            SingleMessage::Source(_) => "Source",
            SingleMessage::Quote(_) => "Quote",
            SingleMessage::At(_) => "At",
            SingleMessage::AtAll => "AtAll",
            SingleMessage::Face(_) => "Face",
            SingleMessage::Plain(_) => "Plain",
            SingleMessage::Image(_) => "Image",
            SingleMessage::FlashImage(_) => "FlashImage",
            SingleMessage::Voice(_) => "Voice",
            SingleMessage::Xml(_) => "Xml",
            SingleMessage::Json(_) => "Json",
            SingleMessage::App(_) => "App",
            SingleMessage::Poke(_) => "Poke",
            SingleMessage::Dice(_) => "Dice",
            SingleMessage::MarketFace(_) => "MarketFace",
            SingleMessage::MusicShare(_) => "MusicShare",
            SingleMessage::Forward(_) => "Forward",
            SingleMessage::File(_) => "File",
            SingleMessage::MiraiCode(_) => "MiraiCode",
        }
    }

    /// Returns the text of a [`SingleMessage::Plain`] segment.
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            SingleMessage::Plain(data) => Some(&data.text),
            _ => None,
        }
    }
}

// ============================================================================
// Segment Builder Methods
// ============================================================================

impl SingleMessage {
    /// Creates a plain text segment.
    pub fn plain(text: impl Into<String>) -> Self {
        SingleMessage::Plain(PlainData { text: text.into() })
    }

    /// Creates an @ segment.
    pub fn at(target: i64) -> Self {
        SingleMessage::At(AtData {
            target,
            display: String::new(),
        })
    }

    /// Creates an @all segment.
    pub fn at_all() -> Self {
        SingleMessage::AtAll
    }

    /// Creates a face segment by numeric id.
    pub fn face(face_id: i32) -> Self {
        SingleMessage::Face(FaceData {
            face_id: Some(face_id),
            name: None,
        })
    }

    /// Creates a face segment by pinyin name.
    pub fn face_named(name: impl Into<String>) -> Self {
        SingleMessage::Face(FaceData {
            face_id: None,
            name: Some(name.into()),
        })
    }

    /// Creates an image segment from a network URL.
    pub fn image_url(url: impl Into<String>) -> Self {
        SingleMessage::Image(ImageData {
            url: Some(url.into()),
            ..Default::default()
        })
    }

    /// Creates an image segment from an already uploaded image id.
    pub fn image_id(image_id: impl Into<String>) -> Self {
        SingleMessage::Image(ImageData {
            image_id: Some(image_id.into()),
            ..Default::default()
        })
    }

    /// Creates an image segment from a path on the server host.
    pub fn image_path(path: impl Into<String>) -> Self {
        SingleMessage::Image(ImageData {
            path: Some(path.into()),
            ..Default::default()
        })
    }

    /// Creates an image segment from base64 data.
    pub fn image_base64(base64: impl Into<String>) -> Self {
        SingleMessage::Image(ImageData {
            base64: Some(base64.into()),
            ..Default::default()
        })
    }

    /// Creates a flash image segment from a network URL.
    pub fn flash_image_url(url: impl Into<String>) -> Self {
        SingleMessage::FlashImage(ImageData {
            url: Some(url.into()),
            ..Default::default()
        })
    }

    /// Creates a voice segment from a network URL.
    pub fn voice_url(url: impl Into<String>) -> Self {
        SingleMessage::Voice(VoiceData {
            url: Some(url.into()),
            ..Default::default()
        })
    }

    /// Creates a voice segment from a path on the server host.
    pub fn voice_path(path: impl Into<String>) -> Self {
        SingleMessage::Voice(VoiceData {
            path: Some(path.into()),
            ..Default::default()
        })
    }

    /// Creates a poke segment.
    pub fn poke(name: PokeName) -> Self {
        SingleMessage::Poke(PokeData { name })
    }

    /// Creates a dice segment with a fixed value.
    pub fn dice(value: i32) -> Self {
        SingleMessage::Dice(DiceData { value })
    }

    /// Creates an XML card segment.
    pub fn xml(xml: impl Into<String>) -> Self {
        SingleMessage::Xml(XmlData { xml: xml.into() })
    }

    /// Creates a JSON card segment.
    pub fn json(json: impl Into<String>) -> Self {
        SingleMessage::Json(JsonData { json: json.into() })
    }

    /// Creates an app card segment.
    pub fn app(content: impl Into<String>) -> Self {
        SingleMessage::App(AppData {
            content: content.into(),
        })
    }

    /// Creates a mirai code segment.
    pub fn mirai_code(code: impl Into<String>) -> Self {
        SingleMessage::MiraiCode(MiraiCodeData { code: code.into() })
    }
}

// ============================================================================
// Segment Data Types
// ============================================================================

/// Message id and send time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceData {
    /// Message id, usable for quoting and recalling.
    pub id: i64,
    /// Send time, unix seconds.
    pub time: i64,
}

/// Quote reply data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuoteData {
    /// Id of the quoted message.
    pub id: i64,
    /// Group of the quoted message, `0` for friend messages.
    pub group_id: i64,
    /// Sender of the quoted message.
    pub sender_id: i64,
    /// Receiver of the quoted message (account or group id).
    pub target_id: i64,
    /// Chain of the quoted message.
    pub origin: MessageChain,
}

/// @ data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtData {
    /// Member account id.
    pub target: i64,
    /// Rendered text. Ignored when sending.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display: String,
}

/// Face data. `face_id` takes precedence over `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceData {
    /// Face id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_id: Option<i32>,
    /// Face pinyin name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Plain text data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainData {
    /// The text.
    pub text: String,
}

/// Image data. Precedence when sending: `image_id`, `url`, `path`, `base64`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    /// Uploaded image id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// Network URL; on receipt, a download link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Path on the server host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Base64 encoded image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
}

/// Voice data. Precedence when sending: `voice_id`, `url`, `path`, `base64`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceData {
    /// Uploaded voice id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    /// Network URL; on receipt, a download link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Path on the server host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Base64 encoded voice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    /// Length in seconds. Only present on receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
}

/// XML card data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlData {
    /// XML text.
    pub xml: String,
}

/// JSON card data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonData {
    /// JSON text.
    pub json: String,
}

/// App card data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppData {
    /// Card content.
    pub content: String,
}

/// Poke kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PokeName {
    /// 戳一戳
    Poke,
    /// 比心
    ShowLove,
    /// 点赞
    Like,
    /// 心碎
    Heartbroken,
    /// 666
    SixSixSix,
    /// 放大招
    FangDaZhao,
    /// Any kind this library does not know yet.
    #[serde(other)]
    Other,
}

/// Poke data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokeData {
    /// Poke kind.
    pub name: PokeName,
}

/// Dice data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceData {
    /// Points.
    pub value: i32,
}

/// Market face data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketFaceData {
    /// Market face id.
    pub id: i32,
    /// Display name.
    pub name: String,
}

/// Music share card data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MusicShareData {
    /// Provider kind.
    pub kind: String,
    /// Title.
    pub title: String,
    /// Summary.
    pub summary: String,
    /// Link opened on click.
    pub jump_url: String,
    /// Cover image URL.
    pub picture_url: String,
    /// Audio URL.
    pub music_url: String,
    /// Brief shown in the conversation list.
    pub brief: String,
}

/// Forwarded message bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardData {
    /// Card display overrides. `None` uses client defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<Map<String, Value>>,
    /// Forwarded nodes.
    #[serde(default)]
    pub node_list: Vec<ForwardNode>,
}

/// One node of a forwarded bundle.
///
/// A node is built from exactly one of: (`sender_id`, `time`,
/// `sender_name`, `message_chain`), `message_id`, or `message_ref`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardNode {
    /// Sender account id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<i64>,
    /// Send time, unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    /// Displayed sender name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Node content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_chain: Option<MessageChain>,
    /// Message id from the current conversation's cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    /// Message from another conversation's cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_ref: Option<MessageRef>,
}

/// Reference to a cached message of another conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    /// Message id.
    pub message_id: i64,
    /// Conversation target (account or group id).
    pub target: i64,
}

/// Group file data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileData {
    /// File id.
    pub id: String,
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
}

/// Mirai code data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiraiCodeData {
    /// Mirai code text.
    pub code: String,
}

// ============================================================================
// Tests
// ============================================================================
