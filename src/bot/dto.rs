pub const DELETE_TRANSACTION_PREFIX: &str = "delete_transaction_";
pub const CONFIRM_RESET_YES: &str = "confirm_reset_yes";
pub const CONFIRM_RESET_NO: &str = "confirm_reset_no";

/// Query the `/gastos` command stands for.
pub const SPENDING_COMMAND_QUERY: &str = "meus gastos este mês";

/// Slash commands. Anything else starting with `/` is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Balance,
    Spending,
    Delete,
    Reset,
}

impl Command {
    /// Parse the first word of a message, e.g. `/saldo` or `/saldo@FinancifyBot`.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?.to_lowercase();
        let name = word.split('@').next().unwrap_or_default();
        match name {
            "/start" | "/ajuda" => Some(Command::Help),
            "/saldo" => Some(Command::Balance),
            "/gastos" => Some(Command::Spending),
            "/excluir" => Some(Command::Delete),
            "/resetar" => Some(Command::Reset),
            _ => None,
        }
    }
}

/// What a button click asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    DeleteTransaction(i64),
    ConfirmReset,
    CancelReset,
    /// Unrecognized token, a no-op.
    Unknown,
}

impl CallbackAction {
    pub fn parse(token: &str) -> Self {
        if let Some(id) = token.strip_prefix(DELETE_TRANSACTION_PREFIX) {
            return id
                .parse::<i64>()
                .map(CallbackAction::DeleteTransaction)
                .unwrap_or(CallbackAction::Unknown);
        }
        match token {
            CONFIRM_RESET_YES => CallbackAction::ConfirmReset,
            CONFIRM_RESET_NO => CallbackAction::CancelReset,
            _ => CallbackAction::Unknown,
        }
    }

    pub fn delete_token(transaction_id: i64) -> String {
        format!("{}{}", DELETE_TRANSACTION_PREFIX, transaction_id)
    }
}
