use tracing::{debug, error, info, instrument, warn};

use super::dto::{CallbackAction, Command, SPENDING_COMMAND_QUERY};
use super::replies::{self, Reply};
use crate::error::StorageError;
use crate::gemini::Intent;
use crate::state::AppState;
use crate::telegram::{Event, MessageContent};
use crate::transactions::{repo, NewTransaction};
use crate::users::User;

const RECENT_FOR_DELETE: i64 = 5;

/// Process one validated webhook event start to finish.
pub async fn handle_event(state: &AppState, event: Event) {
    match event {
        Event::Callback {
            chat_id,
            user_id,
            data,
        } => handle_callback(state, chat_id, user_id, &data).await,
        Event::Message {
            chat_id,
            user_id,
            first_name,
            content,
        } => handle_message(state, chat_id, user_id, &first_name, content).await,
        Event::Ignored => debug!("update ignored"),
    }
}

async fn send(state: &AppState, chat_id: i64, reply: Reply) {
    state
        .messenger
        .send_message(chat_id, &reply.text, reply.keyboard.as_ref())
        .await;
}

#[instrument(skip(state, data))]
async fn handle_callback(state: &AppState, chat_id: i64, telegram_id: i64, data: &str) {
    let user = match User::find_by_platform_id(&state.db, telegram_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(telegram_id, "callback from unknown user ignored");
            return;
        }
        Err(e) => {
            error!(error = %e, telegram_id, "find user for callback failed");
            send(state, chat_id, Reply::text(replies::GENERIC_ERROR)).await;
            return;
        }
    };

    let reply = match CallbackAction::parse(data) {
        CallbackAction::DeleteTransaction(id) => {
            match repo::delete_by_id(&state.db, id, user.id).await {
                Ok(deleted) if deleted > 0 => {
                    info!(user_id = user.id, transaction_id = id, "transaction deleted");
                    Reply::text(replies::DELETE_OK)
                }
                Ok(_) => Reply::text(replies::DELETE_FAILED),
                Err(e) => {
                    error!(error = %e, user_id = user.id, transaction_id = id, "delete failed");
                    Reply::text(replies::GENERIC_ERROR)
                }
            }
        }
        CallbackAction::ConfirmReset => match repo::delete_all(&state.db, user.id).await {
            Ok(deleted) => {
                info!(user_id = user.id, deleted, "all transactions deleted");
                Reply::text(replies::RESET_DONE)
            }
            Err(e) => {
                error!(error = %e, user_id = user.id, "reset failed");
                Reply::text(replies::GENERIC_ERROR)
            }
        },
        CallbackAction::CancelReset => Reply::text(replies::RESET_CANCELLED),
        CallbackAction::Unknown => {
            debug!(data, "unrecognized callback token");
            return;
        }
    };
    send(state, chat_id, reply).await;
}

async fn find_or_create_user(
    state: &AppState,
    telegram_id: i64,
    first_name: &str,
) -> Result<User, StorageError> {
    if let Some(user) = User::find_by_platform_id(&state.db, telegram_id).await? {
        return Ok(user);
    }
    let user = User::create(&state.db, telegram_id, first_name).await?;
    info!(user_id = user.id, telegram_id, "user created");
    Ok(user)
}

#[instrument(skip(state, first_name, content))]
async fn handle_message(
    state: &AppState,
    chat_id: i64,
    telegram_id: i64,
    first_name: &str,
    content: MessageContent,
) {
    let user = match find_or_create_user(state, telegram_id, first_name).await {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, telegram_id, "resolve user failed");
            send(state, chat_id, Reply::text(replies::GENERIC_ERROR)).await;
            return;
        }
    };

    let reply = match content {
        MessageContent::Photo(file_id) => {
            send(state, chat_id, Reply::text(replies::PHOTO_ACK)).await;
            log_receipt(state, &user, &file_id).await
        }
        MessageContent::Text(text) if text.starts_with('/') => match Command::parse(&text) {
            Some(command) => run_command(state, &user, command).await,
            None => {
                debug!(text = %text, "unrecognized command ignored");
                return;
            }
        },
        MessageContent::Text(text) => {
            let intent = state.extractor.classify_intent(&text).await;
            debug!(?intent, "intent classified");
            run_intent(state, &user, intent, &text).await
        }
        MessageContent::Unsupported => Reply::text(replies::UNSUPPORTED_MESSAGE),
    };
    send(state, chat_id, reply).await;
}

async fn run_command(state: &AppState, user: &User, command: Command) -> Reply {
    match command {
        Command::Help => Reply::text(replies::help(&user.first_name)),
        Command::Balance => query_balance(state, user).await,
        Command::Spending => query_spending(state, user, SPENDING_COMMAND_QUERY).await,
        Command::Delete => delete_start(state, user).await,
        Command::Reset => replies::reset_prompt(),
    }
}

async fn run_intent(state: &AppState, user: &User, intent: Intent, text: &str) -> Reply {
    match intent {
        Intent::LogTransaction => log_transaction(state, user, text).await,
        Intent::QuerySpending => query_spending(state, user, text).await,
        Intent::QueryBalance => query_balance(state, user).await,
        Intent::DeleteTransaction => delete_start(state, user).await,
        Intent::ResetData => replies::reset_prompt(),
        Intent::Greeting => Reply::text(replies::greeting(&user.first_name)),
        Intent::Unknown => Reply::text(replies::NOT_UNDERSTOOD),
    }
}

async fn log_transaction(state: &AppState, user: &User, text: &str) -> Reply {
    let fields = match state.extractor.extract_transaction_from_text(text).await {
        Ok(f) => f,
        Err(failure) => {
            warn!(reason = %failure.reason, user_id = user.id, "transaction extraction failed");
            return Reply::text(replies::LOG_EXTRACTION_FAILED);
        }
    };
    match repo::create(&state.db, &fields, user.id).await {
        Ok(tx) => {
            info!(user_id = user.id, transaction_id = tx.id, kind = %tx.kind, "transaction logged");
            Reply::text(replies::transaction_logged(&fields))
        }
        Err(e) => {
            error!(error = %e, user_id = user.id, "save transaction failed");
            Reply::text(replies::LOG_SAVE_FAILED)
        }
    }
}

async fn log_receipt(state: &AppState, user: &User, file_id: &str) -> Reply {
    let Some(image) = state.messenger.download_file(file_id).await else {
        return Reply::text(replies::PHOTO_DOWNLOAD_FAILED);
    };

    let receipt = match state.extractor.extract_transaction_from_image(&image).await {
        Ok(r) => r,
        Err(failure) => {
            warn!(reason = %failure.reason, user_id = user.id, "receipt extraction failed");
            return Reply::text(replies::receipt_unreadable(
                failure.partial_amount,
                failure.partial_description.as_deref(),
            ));
        }
    };

    let fields = NewTransaction::from(receipt);
    match repo::create(&state.db, &fields, user.id).await {
        Ok(tx) => {
            info!(user_id = user.id, transaction_id = tx.id, "receipt logged");
            Reply::text(replies::receipt_logged(&fields))
        }
        Err(e) => {
            error!(error = %e, user_id = user.id, "save receipt transaction failed");
            Reply::text(replies::RECEIPT_SAVE_FAILED)
        }
    }
}

async fn query_spending(state: &AppState, user: &User, text: &str) -> Reply {
    let params = match state.extractor.extract_query_params(text).await {
        Ok(p) => p,
        Err(failure) => {
            warn!(reason = %failure.reason, user_id = user.id, "query extraction failed");
            return Reply::text(replies::QUERY_EXTRACTION_FAILED);
        }
    };

    let rows = match repo::sum_by_category_for_period(
        &state.db,
        user.id,
        params.start_date,
        params.end_date,
        params.category.as_deref(),
    )
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            error!(error = %e, user_id = user.id, "spending query failed");
            return Reply::text(replies::QUERY_FAILED);
        }
    };

    if rows.is_empty() {
        return Reply::text(replies::QUERY_EMPTY);
    }
    let period = replies::period_title(params.start_date, params.end_date);
    Reply::text(replies::spending(&period, params.category.as_deref(), &rows))
}

async fn query_balance(state: &AppState, user: &User) -> Reply {
    match repo::balance(&state.db, user.id).await {
        Ok(b) => Reply::text(replies::balance(&b)),
        Err(e) => {
            error!(error = %e, user_id = user.id, "balance query failed");
            Reply::text(replies::GENERIC_ERROR)
        }
    }
}

async fn delete_start(state: &AppState, user: &User) -> Reply {
    match repo::recent(&state.db, user.id, RECENT_FOR_DELETE).await {
        Ok(recent) => replies::delete_prompt(&recent),
        Err(e) => {
            error!(error = %e, user_id = user.id, "recent transactions query failed");
            Reply::text(replies::GENERIC_ERROR)
        }
    }
}
