pub mod telegram;
pub mod traits;

pub use telegram::{BotCommand, TelegramChannel};
pub use traits::{
    CallbackQuery, ChatKind, ChatTransport, InboundEvent, IncomingMessage, InlineButton, User,
};
