//! Entities - command declarations and the interactions that invoke them

mod command;
mod interaction;

pub use command::{
    CommandDeclaration, CommandKey, CommandKind, CommandOption, CommandOptionChoice, OptionKind,
    RemoteCommand, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_OPTIONS, NO_DESCRIPTION,
};
pub use interaction::{
    Interaction, InteractionData, InteractionKind, InteractionOption,
};
