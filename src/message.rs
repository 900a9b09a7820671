// Message links - the slice of a chat message needed to find a link in it
//
// Entity offsets and lengths count UTF-16 code units, as chat platforms
// report them.

use serde::{Deserialize, Serialize};

/// An annotation over a span of message text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entity {
    /// A link typed directly into the text
    Url { offset: usize, length: usize },
    /// Text whose link target is hidden behind it; only `url` is read
    TextLink {
        #[serde(default)]
        offset: usize,
        #[serde(default)]
        length: usize,
        url: String,
    },
    /// Formatting and everything else we do not care about
    #[serde(other)]
    Other,
}

/// A message with an optional message it replies to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub caption_entities: Vec<Entity>,
    #[serde(default)]
    pub reply_to_message: Option<Box<Message>>,
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>, entities: Vec<Entity>) -> Self {
        self.caption = Some(caption.into());
        self.caption_entities = entities;
        self
    }

    pub fn replying_to(mut self, message: Message) -> Self {
        self.reply_to_message = Some(Box::new(message));
        self
    }

    /// The message, then the message it replies to
    fn chain(&self) -> impl Iterator<Item = &Message> {
        std::iter::once(self).chain(self.reply_to_message.as_deref())
    }
}

/// Find the link a user meant, scanning text links of the message and its
/// reply first, then hidden caption links of both.
pub fn find_link(message: &Message) -> Option<String> {
    for msg in message.chain() {
        let Some(text) = msg.text.as_deref().or(msg.caption.as_deref()) else {
            continue;
        };
        for entity in &msg.entities {
            if let Entity::Url { offset, length } = entity {
                if let Some(link) = utf16_slice(text, *offset, *length) {
                    return Some(link);
                }
            }
        }
    }

    message.chain().find_map(|msg| {
        msg.caption_entities.iter().find_map(|entity| match entity {
            Entity::TextLink { url, .. } => Some(url.clone()),
            _ => None,
        })
    })
}

/// [`find_link`] on the blocking pool; entity scanning over long captions is
/// CPU work the event loop should not do.
pub async fn extract_link_from_message(message: &Message) -> Option<String> {
    let message = message.clone();
    tokio::task::spawn_blocking(move || find_link(&message))
        .await
        .ok()
        .flatten()
}

fn utf16_slice(text: &str, offset: usize, length: usize) -> Option<String> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let end = offset.checked_add(length)?;
    let span = units.get(offset..end)?;
    String::from_utf16(span).ok()
}
