//! Real-time primitives shared between the audio callback and the
//! controlling thread.

pub mod block;
pub mod error;
pub mod parameter;
pub mod port;

pub use block::{resolve_stereo, AudioBlock, ChannelShape, StereoInput, FRAMES_PER_BUFFER};
pub use error::{SendError, TryRecvError, TrySendError};
pub use parameter::{parameter_channel, ParameterReceiver, ParameterSender, ParameterUpdate};
pub use port::{message_port, MessageReceiver, MessageSender, OutgoingMessage};
