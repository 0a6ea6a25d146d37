use serde::{Deserialize, Serialize};

// --- outbound ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Rows of buttons rendered under a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { inline_keyboard: rows }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a InlineKeyboard>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetFileRequest<'a> {
    pub file_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileInfo {
    pub file_path: Option<String>,
}

// --- inbound webhook body ---

#[derive(Debug, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub data: Option<String>,
    pub from: Sender,
    #[serde(default)]
    pub message: Option<CallbackMessage>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackMessage {
    pub chat: Chat,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<Sender>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Sender {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
}

/// A webhook body validated into one of the shapes the bot acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Callback {
        chat_id: i64,
        user_id: i64,
        data: String,
    },
    Message {
        chat_id: i64,
        user_id: i64,
        first_name: String,
        content: MessageContent,
    },
    /// Anything else: acknowledged without a reply.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// File id of the largest size Telegram offered.
    Photo(String),
    Text(String),
    /// Audio, stickers and other kinds the bot does not handle.
    Unsupported,
}

impl From<Update> for Event {
    fn from(update: Update) -> Self {
        if let Some(cb) = update.callback_query {
            return match (cb.data, cb.message) {
                (Some(data), Some(msg)) => Event::Callback {
                    chat_id: msg.chat.id,
                    user_id: cb.from.id,
                    data,
                },
                _ => Event::Ignored,
            };
        }

        let Some(msg) = update.message else {
            return Event::Ignored;
        };
        let Some(from) = msg.from else {
            return Event::Ignored;
        };

        // Telegram lists sizes smallest first.
        let largest_photo = msg
            .photo
            .and_then(|sizes| sizes.into_iter().last())
            .map(|p| p.file_id);
        let content = match (largest_photo, msg.text) {
            (Some(file_id), _) => MessageContent::Photo(file_id),
            (None, Some(text)) => MessageContent::Text(text),
            (None, None) => MessageContent::Unsupported,
        };

        Event::Message {
            chat_id: msg.chat.id,
            user_id: from.id,
            first_name: from.first_name,
            content,
        }
    }
}
