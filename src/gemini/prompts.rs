use time::Date;

use crate::transactions::{MonthlySpending, CATEGORIES};

/// Reply the insight prompt asks for when nothing is worth saying.
pub const NO_INSIGHT: &str = "NO_INSIGHT";

fn category_list() -> String {
    let quoted: Vec<String> = CATEGORIES.iter().map(|c| format!("\"{}\"", c)).collect();
    format!("[{}]", quoted.join(", "))
}

pub fn classify_intent(text: &str) -> String {
    format!(
        r#"Analise o texto do usuário e classifique sua intenção principal em uma das categorias:
- "log_transaction": registrar uma despesa ou receita (ex: "gastei 50", "recebi 1000").
- "query_spending": pergunta sobre gastos (ex: "quanto gastei?", "gastos com comida?").
- "query_balance": saber o saldo total (ex: "qual meu saldo?", "quanto dinheiro eu tenho?").
- "delete_transaction": apagar uma transação específica (ex: "apagar último gasto").
- "reset_data": apagar todos os dados (ex: "resetar conta", "começar do zero").
- "greeting": apenas um cumprimento (ex: "oi", "bom dia").
- "unknown": a intenção não é clara.

Responda APENAS com JSON, por exemplo: {{"intent": "log_transaction"}}

Texto do usuário: "{text}""#
    )
}

pub fn extract_transaction(text: &str, today: Date) -> String {
    format!(
        r#"Você extrai dados de uma transação financeira.
A data de hoje é {today}.

Extraia valor, descrição, categoria e data do texto abaixo.
Categorias válidas: {categories}.
O tipo é "despesa", a menos que o usuário diga "recebi", "ganhei" ou algo equivalente (tipo "receita").

Responda APENAS com JSON.
Sucesso: {{"tipo": "despesa", "valor": 50.00, "descricao": "almoço", "categoria": "Alimentação", "data": "{today}"}}
Erro: {{"error": "Dados insuficientes."}}

Texto do usuário: "{text}""#,
        categories = category_list(),
    )
}

pub fn extract_query_params(text: &str, today: Date) -> String {
    format!(
        r#"Você extrai parâmetros de uma pergunta sobre gastos.
A data de hoje é {today}.

Extraia a "category" e o período ("start_date" e "end_date", formato YYYY-MM-DD).
- Um mês citado (ex: "julho", "mês passado"): primeiro e último dia daquele mês.
- "este mês": o mês atual.
- "hoje": a data de hoje como início e fim.
- Sem categoria citada: "category" nulo (null).
Categorias válidas: {categories}.

Responda APENAS com JSON.
Exemplo: "quanto gastei com transporte em julho?" -> {{"category": "Transporte", "start_date": "2025-07-01", "end_date": "2025-07-31"}}
Exemplo: "meus gastos este mês" -> {{"category": null, "start_date": "2025-07-01", "end_date": "2025-07-31"}}

Pergunta do usuário: "{text}""#,
        categories = category_list(),
    )
}

pub fn extract_receipt(today: Date) -> String {
    format!(
        r#"Você lê comprovantes e notas fiscais.
Extraia da imagem:
- "valor": valor total da compra, como número.
- "descricao": nome do estabelecimento ou breve descrição.
- "data": data da transação (YYYY-MM-DD). Se não encontrar, use {today}.
Sugira uma "categoria" pelo estabelecimento. Categorias válidas: {categories}.
A transação é sempre uma despesa.

Responda APENAS com JSON. Se não for possível ler o comprovante: {{"error": "motivo"}}"#,
        categories = category_list(),
    )
}

pub fn spending_insight(summary: &MonthlySpending) -> Result<String, serde_json::Error> {
    let summary_json = serde_json::to_string_pretty(summary)?;
    Ok(format!(
        r#"Você é um assistente financeiro proativo e amigável. Analise o resumo de gastos dos últimos 3 meses de um usuário (valores em R$, agrupados por mês "YYYY-MM") e gere UM ÚNICO insight curto.

{summary_json}

Regras:
1. Compare os gastos do mês mais recente com a média dos meses anteriores.
2. Procure aumentos ou quedas relevantes em categorias específicas.
3. Se houver algo notável, escreva uma mensagem curta e amigável, começando com um emoji (💡, 📈, ⚠️).
4. Se não houver nada interessante ou os dados forem insuficientes, responda EXATAMENTE "{NO_INSIGHT}".

Exemplo: "💡 Seus gastos com 'Alimentação' este mês foram de R$ 850, acima da sua média de R$ 700. Vale ficar de olho!""#
    ))
}
