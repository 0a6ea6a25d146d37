//! Reply texts. Markup is Telegram's legacy Markdown, bold is `*text*`.

use time::Date;

use super::dto::{CallbackAction, CONFIRM_RESET_NO, CONFIRM_RESET_YES};
use crate::telegram::{InlineButton, InlineKeyboard};
use crate::transactions::{Balance, CategoryTotal, NewTransaction, Transaction, TransactionKind};

pub const GENERIC_ERROR: &str = "Ops, algo deu errado. Tente novamente em instantes.";
pub const LOG_EXTRACTION_FAILED: &str = "Desculpe, não consegui extrair os dados da transação. \
     Tente ser mais específico, como 'Gastei 50 no mercado'.";
pub const LOG_SAVE_FAILED: &str = "Ocorreu um erro ao salvar sua transação.";
pub const QUERY_EXTRACTION_FAILED: &str = "Não consegui entender o período da sua pergunta. \
     Tente algo como 'este mês' ou 'em julho'.";
pub const QUERY_EMPTY: &str = "Não encontrei nenhum gasto para sua consulta.";
pub const QUERY_FAILED: &str = "Ocorreu um erro ao processar sua consulta.";
pub const DELETE_EMPTY: &str = "Você ainda não tem nenhuma transação para excluir.";
pub const DELETE_OK: &str = "✅ Transação excluída com sucesso!";
pub const DELETE_FAILED: &str = "❌ Erro ao excluir.";
pub const RESET_DONE: &str = "✅ Todos os seus dados foram apagados.";
pub const RESET_CANCELLED: &str = "Operação cancelada.";
pub const PHOTO_ACK: &str = "🔍 Entendi! Processando a imagem do seu comprovante...";
pub const PHOTO_DOWNLOAD_FAILED: &str =
    "❌ Desculpe, não consegui baixar a imagem do comprovante. Tente novamente.";
pub const RECEIPT_SAVE_FAILED: &str = "Ocorreu um erro ao salvar a transação do seu comprovante.";
pub const NOT_UNDERSTOOD: &str =
    "Desculpe, não entendi. Use os comandos do menu ou tente descrever um gasto.";
pub const UNSUPPORTED_MESSAGE: &str = "Não sei o que fazer com essa mensagem. 🤔";

const MONTH_NAMES: [&str; 12] = [
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro",
    "Outubro", "Novembro", "Dezembro",
];

const BUTTON_LABEL_CHARS: usize = 20;

/// One outgoing message.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: InlineKeyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

pub fn money(amount: f64) -> String {
    format!("R$ {:.2}", amount)
}

fn is_markdown_special(c: char) -> bool {
    matches!(c, '_' | '*' | '`' | '[')
}

/// Escape characters that would open a Markdown entity in user-provided text.
/// Only valid outside an entity.
pub fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if is_markdown_special(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Bold `s`. Escapes are not allowed inside an entity, so the bold is closed
/// around each special character, which is escaped outside it.
pub fn bold(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    let mut run = String::new();
    for c in s.chars() {
        if is_markdown_special(c) {
            if !run.is_empty() {
                out.push_str(&format!("*{}*", run));
                run.clear();
            }
            out.push('\\');
            out.push(c);
        } else {
            run.push(c);
        }
    }
    if !run.is_empty() {
        out.push_str(&format!("*{}*", run));
    }
    out
}

fn day_month(d: Date) -> String {
    format!("{:02}/{:02}", d.day(), u8::from(d.month()))
}

/// Month name when `[start, end]` is exactly one calendar month, otherwise `de DD/MM a DD/MM`.
pub fn period_title(start: Date, end: Date) -> String {
    let full_month = start.day() == 1
        && start.year() == end.year()
        && start.month() == end.month()
        && end.day() == end.month().length(end.year());
    if full_month {
        MONTH_NAMES[usize::from(u8::from(start.month())) - 1].to_string()
    } else {
        format!("de {} a {}", day_month(start), day_month(end))
    }
}

pub fn help(first_name: &str) -> String {
    format!(
        "Olá, {}! Sou seu assistente financeiro.\n\
         Use os comandos do menu ou simplesmente me diga o que você gastou.\n\n\
         /saldo - ver seu saldo\n\
         /gastos - gastos deste mês\n\
         /excluir - apagar uma transação\n\
         /resetar - apagar todos os dados",
        escape_markdown(first_name)
    )
}

pub fn greeting(first_name: &str) -> String {
    format!("Olá, {}! Como posso ajudar?", escape_markdown(first_name))
}

pub fn transaction_logged(tx: &NewTransaction) -> String {
    format!(
        "✅ Transação registrada!\n*- Categoria:* {}\n*- Valor:* {}",
        escape_markdown(&tx.category),
        money(tx.amount)
    )
}

pub fn receipt_logged(tx: &NewTransaction) -> String {
    format!(
        "✅ Gasto do comprovante registrado!\n*- Categoria:* {}\n*- Valor:* {}",
        escape_markdown(&tx.category),
        money(tx.amount)
    )
}

/// Hint for an unreadable receipt, echoing back what was read.
pub fn receipt_unreadable(amount: Option<f64>, description: Option<&str>) -> String {
    let amount = amount.map(|a| format!("{:.2}", a)).unwrap_or_else(|| "XX".into());
    let description = description.map(escape_markdown).unwrap_or_else(|| "YYY".into());
    format!(
        "Não consegui ler os dados do comprovante. Por favor, digite manualmente \
         (ex: 'gastei {} em {}')",
        amount, description
    )
}

/// Spending summary. `category` is the single category the user asked about, if any.
pub fn spending(period: &str, category: Option<&str>, rows: &[CategoryTotal]) -> String {
    match (category, rows.first()) {
        (Some(category), Some(row)) => format!(
            "📊 {}\n\n*- Total:* {}",
            bold(&format!("Gastos com {} em {}", category, period)),
            money(row.total)
        ),
        _ => {
            let mut text = format!("📊 *Resumo de Gastos de {}*\n\n", period);
            for row in rows {
                text.push_str(&format!(
                    "{} {}\n",
                    bold(&format!("- {}:", row.category)),
                    money(row.total)
                ));
            }
            let grand_total: f64 = rows.iter().map(|r| r.total).sum();
            text.push_str(&format!("\n*Total Geral:* {}", money(grand_total)));
            text
        }
    }
}

pub fn balance(b: &Balance) -> String {
    format!(
        "💰 *Seu Saldo Atual*\n\n\
         📈 *Total de Receitas:* {}\n\
         📉 *Total de Despesas:* {}\n\
         --------------------\n\
         🏦 *Saldo Restante:* {}",
        money(b.income),
        money(b.expense),
        money(b.balance)
    )
}

pub fn delete_prompt(recent: &[Transaction]) -> Reply {
    if recent.is_empty() {
        return Reply::text(DELETE_EMPTY);
    }

    let mut text = String::from("Qual transação você gostaria de excluir?\n\n");
    let mut rows = Vec::with_capacity(recent.len());
    for t in recent {
        let emoji = match t.kind {
            TransactionKind::Expense => "📉",
            TransactionKind::Income => "📈",
        };
        text.push_str(&format!(
            "{} {} - {} em {}\n",
            emoji,
            bold(&t.description),
            money(t.amount),
            day_month(t.transaction_date)
        ));
        let label: String = t.description.chars().take(BUTTON_LABEL_CHARS).collect();
        rows.push(vec![InlineButton::new(
            format!("❌ Excluir: {}", label),
            CallbackAction::delete_token(t.id),
        )]);
    }
    Reply::with_keyboard(text, InlineKeyboard::new(rows))
}

pub fn reset_prompt() -> Reply {
    Reply::with_keyboard(
        "⚠️ *Atenção!* Você tem certeza que deseja apagar TODAS as suas receitas e despesas?\n\n\
         *Essa ação não pode ser desfeita.*",
        InlineKeyboard::new(vec![vec![
            InlineButton::new("Sim, apagar tudo", CONFIRM_RESET_YES),
            InlineButton::new("Não, cancelar", CONFIRM_RESET_NO),
        ]]),
    )
}
