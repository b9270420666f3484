//! Обработка одного запроса к `/v1/api/suggest`: проверка метода и пути,
//! разбор тела, поиск по индексу и формирование ответа.
//!
//! Ответ с совпадениями — JSON `{"suggestions": [...]}`, без совпадений —
//! простой текст `No suggestions` (сохраняется ради совместимости с
//! существующими клиентами).

use suggest_common::{
    CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT, NO_SUGGESTIONS, RequestError, SUGGEST_ROUTE,
    SuggestQuery, SuggestResult,
};
use tiny_http::Method;

use crate::index::SuggestionIndex;

/// Готовый ответ без привязки к соединению.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    /// Тело ответа; для HEAD по нему считается только `Content-Length`.
    pub body: String,
    /// `false` для HEAD — отправляются только заголовки.
    pub send_body: bool,
}

/// Обрабатывает запрос и всегда возвращает ответ: ошибки запроса
/// превращаются в 400/404 с текстом диагностики.
///
/// # Примеры
///
/// ```
/// use suggest_common::RawRecord;
/// use suggest_server::{handler::handle, index::SuggestionIndex};
/// use tiny_http::Method;
///
/// let index = SuggestionIndex::new();
/// index.install(vec![RawRecord { id: "hel".into(), name: "Hello".into(), cost: 5.0 }]);
///
/// let reply = handle(&index, &Method::Post, "/v1/api/suggest", br#"{"input": "hel"}"#);
/// assert_eq!(reply.status, 200);
/// assert_eq!(reply.body, r#"{"suggestions":[{"text":"Hello","position":0}]}"#);
///
/// let reply = handle(&index, &Method::Get, "/v1/api/suggest", b"");
/// assert_eq!(reply.status, 400);
/// ```
pub fn handle(index: &SuggestionIndex, method: &Method, path: &str, body: &[u8]) -> Reply {
    let send_body = *method != Method::Head;
    match suggest(index, method, path, body) {
        Ok(body) => Reply { status: 200, content_type: CONTENT_TYPE_JSON, body, send_body },
        Err(e) => Reply {
            status: e.status(),
            content_type: CONTENT_TYPE_TEXT,
            body: e.to_string(),
            send_body,
        },
    }
}

fn suggest(
    index: &SuggestionIndex,
    method: &Method,
    path: &str,
    body: &[u8],
) -> Result<String, RequestError> {
    if !matches!(method, Method::Post | Method::Head) {
        return Err(RequestError::UnknownMethod);
    }
    if path != SUGGEST_ROUTE {
        return Err(RequestError::NotFound(path.to_string()));
    }

    let query = parse_query(body)?;
    Ok(render(&index.lookup(&query.input)))
}

/// Разбирает тело запроса `{"input": "<строка>"}`.
///
/// Невалидный JSON — [`RequestError::MalformedJson`] с текстом парсера;
/// валидный JSON без строкового поля `input` — [`RequestError::InvalidFormat`].
pub fn parse_query(body: &[u8]) -> Result<SuggestQuery, RequestError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| RequestError::MalformedJson(e.to_string()))?;
    serde_json::from_value(value).map_err(|_| RequestError::InvalidFormat)
}

/// Текст тела ответа для результата поиска.
pub fn render(result: &SuggestResult) -> String {
    match result {
        SuggestResult::Empty => NO_SUGGESTIONS.to_string(),
        SuggestResult::Found(response) => {
            serde_json::to_string(response).expect("suggestions always serialize to JSON")
        }
    }
}
