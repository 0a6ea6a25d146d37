use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use tracing::{instrument, warn};

use super::services::handle_event;
use crate::state::AppState;
use crate::telegram::Update;

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhook/telegram", post(telegram_webhook))
}

/// POST /webhook/telegram
/// Always 200 with an empty body, Telegram only needs the acknowledgement.
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn telegram_webhook(State(state): State<AppState>, body: Bytes) -> StatusCode {
    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => handle_event(&state, update.into()).await,
        Err(e) => warn!(error = %e, "unparseable webhook body acknowledged"),
    }
    StatusCode::OK
}

#[cfg(test)]
mod webhook_tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use time::macros::date;
    use tower::ServiceExt;

    use crate::app::build_app;
    use crate::bot::replies;
    use crate::gemini::{ExtractionFailure, Intent, QueryParams, ReceiptData};
    use crate::state::AppState;
    use crate::testing::{RecordingMessenger, ScriptedExtractor};
    use crate::transactions::{repo, NewTransaction, TransactionKind};
    use crate::users::User;

    const CHAT: i64 = 555;
    const TG_USER: i64 = 1001;

    struct Harness {
        state: AppState,
        messenger: Arc<RecordingMessenger>,
        extractor: Arc<ScriptedExtractor>,
    }

    impl Harness {
        async fn new(messenger: RecordingMessenger, extractor: ScriptedExtractor) -> Self {
            let messenger = Arc::new(messenger);
            let extractor = Arc::new(extractor);
            let state = AppState::fake(messenger.clone(), extractor.clone()).await;
            Self { state, messenger, extractor }
        }

        async fn post_raw(&self, body: String) {
            let res = build_app(self.state.clone())
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/webhook/telegram")
                        .header("content-type", "application/json")
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
            assert!(bytes.is_empty());
        }

        async fn post(&self, body: Value) {
            self.post_raw(body.to_string()).await
        }

        async fn text(&self, text: &str) {
            self.post(json!({
                "update_id": 1,
                "message": {
                    "chat": {"id": CHAT},
                    "from": {"id": TG_USER, "first_name": "Ana"},
                    "text": text
                }
            }))
            .await
        }

        async fn click(&self, from: i64, data: &str) {
            self.post(json!({
                "callback_query": {
                    "id": "cb",
                    "data": data,
                    "from": {"id": from, "first_name": "Ana"},
                    "message": {"chat": {"id": CHAT}}
                }
            }))
            .await
        }

        async fn user(&self) -> User {
            User::find_by_platform_id(&self.state.db, TG_USER)
                .await
                .unwrap()
                .expect("user created")
        }

        async fn drop_table(&self, table: &str) {
            sqlx::query(&format!("DROP TABLE {}", table))
                .execute(&self.state.db)
                .await
                .unwrap();
        }

        async fn seed(&self, user: &User, amount: f64, kind: TransactionKind, category: &str) -> i64 {
            let fields = NewTransaction {
                description: format!("{} item", category),
                amount,
                kind,
                category: category.into(),
                transaction_date: date!(2025 - 07 - 10),
            };
            repo::create(&self.state.db, &fields, user.id).await.unwrap().id
        }
    }

    fn mercado() -> NewTransaction {
        NewTransaction {
            description: "mercado".into(),
            amount: 50.0,
            kind: TransactionKind::Expense,
            category: "Alimentação".into(),
            transaction_date: crate::state::FAKE_NOW.date(),
        }
    }

    #[tokio::test]
    async fn logs_transaction_from_free_text() {
        let h = Harness::new(
            RecordingMessenger::default(),
            ScriptedExtractor {
                intent: Intent::LogTransaction,
                transaction: Ok(mercado()),
                ..Default::default()
            },
        )
        .await;

        h.text("gastei 50 no mercado").await;

        let sent = h.messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, CHAT);
        assert!(sent[0].text.contains("R$ 50.00"));
        assert!(sent[0].text.contains("Alimentação"));

        let user = h.user().await;
        assert_eq!(user.first_name, "Ana");
        let saved = repo::recent(&h.state.db, user.id, 5).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].amount, 50.0);
        assert_eq!(saved[0].kind, TransactionKind::Expense);
        assert_eq!(saved[0].category, "Alimentação");
        assert_eq!(saved[0].description, "mercado");
        assert_eq!(
            h.extractor.prompts(),
            vec!["gastei 50 no mercado".to_string(), "gastei 50 no mercado".to_string()]
        );
    }

    #[tokio::test]
    async fn garbled_text_is_not_persisted() {
        let h = Harness::new(
            RecordingMessenger::default(),
            ScriptedExtractor {
                intent: Intent::LogTransaction,
                transaction: Err(ExtractionFailure::new("Dados insuficientes.")),
                ..Default::default()
            },
        )
        .await;

        h.text("asdkj qwe 123??").await;

        assert_eq!(h.messenger.texts(), vec![replies::LOG_EXTRACTION_FAILED.to_string()]);
        let user = h.user().await;
        assert!(repo::recent(&h.state.db, user.id, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn balance_command_for_new_user_is_zero() {
        let h = Harness::new(RecordingMessenger::default(), ScriptedExtractor::default()).await;

        h.text("/saldo").await;

        let texts = h.messenger.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("*Total de Receitas:* R$ 0.00"));
        assert!(texts[0].contains("*Total de Despesas:* R$ 0.00"));
        assert!(texts[0].contains("*Saldo Restante:* R$ 0.00"));
        // commands never reach the classifier
        assert!(h.extractor.prompts().is_empty());
    }

    #[tokio::test]
    async fn balance_intent_reflects_transactions() {
        let h = Harness::new(
            RecordingMessenger::default(),
            ScriptedExtractor { intent: Intent::QueryBalance, ..Default::default() },
        )
        .await;
        h.text("oi").await;
        let user = h.user().await;
        h.seed(&user, 1000.0, TransactionKind::Income, "Trabalho").await;
        h.seed(&user, 250.0, TransactionKind::Expense, "Moradia").await;

        h.text("qual meu saldo?").await;

        let last = h.messenger.texts().pop().unwrap();
        assert!(last.contains("R$ 1000.00"));
        assert!(last.contains("R$ 250.00"));
        assert!(last.contains("*Saldo Restante:* R$ 750.00"));
    }

    #[tokio::test]
    async fn reset_cancel_deletes_nothing() {
        let h = Harness::new(RecordingMessenger::default(), ScriptedExtractor::default()).await;
        h.text("/start").await;
        let user = h.user().await;
        h.seed(&user, 10.0, TransactionKind::Expense, "Lazer").await;

        h.click(TG_USER, "confirm_reset_no").await;

        assert_eq!(h.messenger.texts().last().unwrap(), replies::RESET_CANCELLED);
        assert_eq!(repo::recent(&h.state.db, user.id, 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reset_flow_deletes_everything_after_confirmation() {
        let h = Harness::new(RecordingMessenger::default(), ScriptedExtractor::default()).await;
        h.text("/resetar").await;
        let user = h.user().await;
        h.seed(&user, 10.0, TransactionKind::Expense, "Lazer").await;
        h.seed(&user, 20.0, TransactionKind::Income, "Trabalho").await;

        let prompt = h.messenger.sent().pop().unwrap();
        assert!(prompt.keyboard.is_some());
        assert_eq!(repo::recent(&h.state.db, user.id, 5).await.unwrap().len(), 2);

        h.click(TG_USER, "confirm_reset_yes").await;

        assert_eq!(h.messenger.texts().last().unwrap(), replies::RESET_DONE);
        assert!(repo::recent(&h.state.db, user.id, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_flow_lists_recent_and_deletes_on_click() {
        let h = Harness::new(
            RecordingMessenger::default(),
            ScriptedExtractor { intent: Intent::DeleteTransaction, ..Default::default() },
        )
        .await;
        h.text("/excluir").await;
        assert_eq!(h.messenger.texts(), vec![replies::DELETE_EMPTY.to_string()]);

        let user = h.user().await;
        let mut ids = Vec::new();
        for i in 0..6 {
            ids.push(h.seed(&user, 1.0 + i as f64, TransactionKind::Expense, "Lazer").await);
        }

        h.text("apagar último gasto").await;
        let prompt = h.messenger.sent().pop().unwrap();
        let kb = prompt.keyboard.expect("buttons");
        assert_eq!(kb.inline_keyboard.len(), 5);
        let newest = *ids.last().unwrap();
        assert_eq!(
            kb.inline_keyboard[0][0].callback_data,
            format!("delete_transaction_{}", newest)
        );

        h.click(TG_USER, &kb.inline_keyboard[0][0].callback_data).await;
        assert_eq!(h.messenger.texts().last().unwrap(), replies::DELETE_OK);

        // second tap on the same button finds nothing to delete
        h.click(TG_USER, &kb.inline_keyboard[0][0].callback_data).await;
        assert_eq!(h.messenger.texts().last().unwrap(), replies::DELETE_FAILED);
        assert_eq!(repo::recent(&h.state.db, user.id, 10).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn callback_cannot_delete_another_users_transaction() {
        let h = Harness::new(RecordingMessenger::default(), ScriptedExtractor::default()).await;
        h.text("/start").await;
        let owner = h.user().await;
        let id = h.seed(&owner, 10.0, TransactionKind::Expense, "Lazer").await;
        User::create(&h.state.db, 2002, "Intrusa").await.unwrap();

        h.click(2002, &format!("delete_transaction_{}", id)).await;

        assert_eq!(h.messenger.texts().last().unwrap(), replies::DELETE_FAILED);
        assert_eq!(repo::recent(&h.state.db, owner.id, 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn callbacks_from_unknown_users_and_tokens_are_silent() {
        let h = Harness::new(RecordingMessenger::default(), ScriptedExtractor::default()).await;
        h.click(9999, "confirm_reset_yes").await;
        assert!(h.messenger.sent().is_empty());
        assert!(User::find_by_platform_id(&h.state.db, 9999).await.unwrap().is_none());

        h.text("/start").await;
        let before = h.messenger.sent().len();
        h.click(TG_USER, "mystery_token").await;
        h.click(TG_USER, "delete_transaction_notanumber").await;
        assert_eq!(h.messenger.sent().len(), before);
    }

    #[tokio::test]
    async fn unknown_commands_are_ignored_but_create_the_user() {
        let h = Harness::new(RecordingMessenger::default(), ScriptedExtractor::default()).await;
        h.text("/pizza").await;
        assert!(h.messenger.sent().is_empty());
        h.user().await;
    }

    #[tokio::test]
    async fn help_and_greeting_use_display_name() {
        let h = Harness::new(
            RecordingMessenger::default(),
            ScriptedExtractor { intent: Intent::Greeting, ..Default::default() },
        )
        .await;
        h.text("/ajuda").await;
        h.text("bom dia").await;
        let texts = h.messenger.texts();
        assert!(texts[0].starts_with("Olá, Ana! Sou seu assistente financeiro."));
        assert_eq!(texts[1], "Olá, Ana! Como posso ajudar?");
    }

    #[tokio::test]
    async fn unknown_intent_gets_fixed_reply() {
        let h = Harness::new(RecordingMessenger::default(), ScriptedExtractor::default()).await;
        h.text("qual a capital da França?").await;
        assert_eq!(h.messenger.texts(), vec![replies::NOT_UNDERSTOOD.to_string()]);
    }

    #[tokio::test]
    async fn spending_command_uses_this_month_query() {
        let h = Harness::new(
            RecordingMessenger::default(),
            ScriptedExtractor {
                query: Ok(QueryParams {
                    category: None,
                    start_date: date!(2025 - 07 - 01),
                    end_date: date!(2025 - 07 - 31),
                }),
                ..Default::default()
            },
        )
        .await;
        h.text("/gastos").await;
        assert_eq!(h.messenger.texts(), vec![replies::QUERY_EMPTY.to_string()]);
        assert_eq!(h.extractor.prompts(), vec!["meus gastos este mês".to_string()]);

        let user = h.user().await;
        h.seed(&user, 20.0, TransactionKind::Expense, "Alimentação").await;
        h.seed(&user, 5.0, TransactionKind::Expense, "Transporte").await;
        h.seed(&user, 900.0, TransactionKind::Income, "Trabalho").await;

        h.text("/gastos").await;
        let last = h.messenger.texts().pop().unwrap();
        assert!(last.contains("Resumo de Gastos de Julho"));
        assert!(last.contains("*- Alimentação:* R$ 20.00"));
        assert!(last.contains("*- Transporte:* R$ 5.00"));
        assert!(last.contains("*Total Geral:* R$ 25.00"));
    }

    #[tokio::test]
    async fn spending_for_single_category_and_partial_period() {
        let h = Harness::new(
            RecordingMessenger::default(),
            ScriptedExtractor {
                intent: Intent::QuerySpending,
                query: Ok(QueryParams {
                    category: Some("Transporte".into()),
                    start_date: date!(2025 - 07 - 05),
                    end_date: date!(2025 - 07 - 20),
                }),
                ..Default::default()
            },
        )
        .await;
        h.text("oi").await;
        let user = h.user().await;
        h.seed(&user, 20.0, TransactionKind::Expense, "Alimentação").await;
        h.seed(&user, 7.5, TransactionKind::Expense, "Transporte").await;

        h.text("quanto gastei com transporte?").await;
        let last = h.messenger.texts().pop().unwrap();
        assert!(last.contains("Gastos com Transporte em de 05/07 a 20/07"));
        assert!(last.contains("*- Total:* R$ 7.50"));
        assert!(!last.contains("Alimentação"));
    }

    #[tokio::test]
    async fn spending_query_extraction_failure_gets_hint() {
        let h = Harness::new(
            RecordingMessenger::default(),
            ScriptedExtractor { intent: Intent::QuerySpending, ..Default::default() },
        )
        .await;
        h.text("quanto gastei naquela vez?").await;
        assert_eq!(h.messenger.texts(), vec![replies::QUERY_EXTRACTION_FAILED.to_string()]);
    }

    #[tokio::test]
    async fn photo_receipt_is_logged_as_expense() {
        let h = Harness::new(
            RecordingMessenger::with_file(b"jpeg bytes"),
            ScriptedExtractor {
                receipt: Ok(ReceiptData {
                    description: "Farmácia Central".into(),
                    amount: 89.9,
                    category: "Saúde".into(),
                    date: date!(2025 - 07 - 12),
                }),
                ..Default::default()
            },
        )
        .await;

        h.post(json!({
            "message": {
                "chat": {"id": CHAT},
                "from": {"id": TG_USER, "first_name": "Ana"},
                "photo": [{"file_id": "small"}, {"file_id": "large"}]
            }
        }))
        .await;

        let texts = h.messenger.texts();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0], replies::PHOTO_ACK);
        assert!(texts[1].contains("Gasto do comprovante registrado"));
        assert!(texts[1].contains("R$ 89.90"));

        let user = h.user().await;
        let saved = repo::recent(&h.state.db, user.id, 1).await.unwrap();
        assert_eq!(saved[0].kind, TransactionKind::Expense);
        assert_eq!(saved[0].category, "Saúde");
        assert_eq!(saved[0].transaction_date, date!(2025 - 07 - 12));
    }

    #[tokio::test]
    async fn photo_download_failure_gets_hint() {
        let h = Harness::new(RecordingMessenger::default(), ScriptedExtractor::default()).await;
        h.post(json!({
            "message": {
                "chat": {"id": CHAT},
                "from": {"id": TG_USER, "first_name": "Ana"},
                "photo": [{"file_id": "only"}]
            }
        }))
        .await;
        assert_eq!(
            h.messenger.texts(),
            vec![replies::PHOTO_ACK.to_string(), replies::PHOTO_DOWNLOAD_FAILED.to_string()]
        );
    }

    #[tokio::test]
    async fn unreadable_receipt_echoes_partial_fields() {
        let h = Harness::new(
            RecordingMessenger::with_file(b"blurry"),
            ScriptedExtractor {
                receipt: Err(ExtractionFailure {
                    reason: "ilegível".into(),
                    partial_amount: None,
                    partial_description: Some("Padaria".into()),
                }),
                ..Default::default()
            },
        )
        .await;
        h.post(json!({
            "message": {
                "chat": {"id": CHAT},
                "from": {"id": TG_USER, "first_name": "Ana"},
                "photo": [{"file_id": "p"}]
            }
        }))
        .await;
        let last = h.messenger.texts().pop().unwrap();
        assert!(last.contains("'gastei XX em Padaria'"));
        let user = h.user().await;
        assert!(repo::recent(&h.state.db, user.id, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsupported_message_kind_gets_fallback() {
        let h = Harness::new(RecordingMessenger::default(), ScriptedExtractor::default()).await;
        h.post(json!({
            "message": {
                "chat": {"id": CHAT},
                "from": {"id": TG_USER, "first_name": "Ana"},
                "voice": {"file_id": "v"}
            }
        }))
        .await;
        assert_eq!(h.messenger.texts(), vec![replies::UNSUPPORTED_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn malformed_bodies_are_acknowledged() {
        let h = Harness::new(RecordingMessenger::default(), ScriptedExtractor::default()).await;
        h.post_raw("{not json".into()).await;
        h.post(json!({"edited_message": {"chat": {"id": CHAT}}})).await;
        h.post(json!({"message": {"chat": "wrong"}})).await;
        assert!(h.messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn storage_failures_get_generic_error() {
        let h = Harness::new(RecordingMessenger::default(), ScriptedExtractor::default()).await;
        h.text("/start").await;
        h.drop_table("transactions").await;

        h.text("/saldo").await;
        h.text("/excluir").await;
        h.click(TG_USER, "delete_transaction_1").await;
        h.click(TG_USER, "confirm_reset_yes").await;

        let texts = h.messenger.texts();
        assert_eq!(texts.len(), 5);
        for text in &texts[1..] {
            assert_eq!(text, replies::GENERIC_ERROR);
        }
    }

    #[tokio::test]
    async fn failed_user_resolution_gets_generic_error() {
        let h = Harness::new(RecordingMessenger::default(), ScriptedExtractor::default()).await;
        h.drop_table("transactions").await;
        h.drop_table("users").await;

        h.text("/saldo").await;
        h.click(TG_USER, "confirm_reset_no").await;

        assert_eq!(
            h.messenger.texts(),
            vec![replies::GENERIC_ERROR.to_string(), replies::GENERIC_ERROR.to_string()]
        );
    }

    #[tokio::test]
    async fn storage_failures_in_logging_and_queries_get_routine_errors() {
        let h = Harness::new(
            RecordingMessenger::default(),
            ScriptedExtractor {
                intent: Intent::LogTransaction,
                transaction: Ok(mercado()),
                query: Ok(QueryParams {
                    category: None,
                    start_date: date!(2025 - 07 - 01),
                    end_date: date!(2025 - 07 - 31),
                }),
                ..Default::default()
            },
        )
        .await;
        h.text("/start").await;
        h.drop_table("transactions").await;

        h.text("gastei 50 no mercado").await;
        h.text("/gastos").await;

        let texts = h.messenger.texts();
        assert_eq!(texts[1], replies::LOG_SAVE_FAILED);
        assert_eq!(texts[2], replies::QUERY_FAILED);
    }
}
