//! Библиотека suggestion-server — ранжированные подсказки по HTTP с фоновым
//! обновлением данных.
//!
//! Состав:
//! - [`index`] — активный снимок подсказок и поиск по нему;
//! - [`source`] — источники данных (JSON-файл на диске);
//! - [`refresher`] — фоновый поток периодической перезагрузки снимка;
//! - [`handler`] — валидация одного запроса и формирование ответа;
//! - [`server`] — цикл приёма HTTP-запросов.
//!
//! # Пример
//!
//! ```
//! use suggest_common::RawRecord;
//! use suggest_server::index::SuggestionIndex;
//!
//! let index = SuggestionIndex::new();
//! index.install(vec![RawRecord { id: "hel".into(), name: "Hello".into(), cost: 5.0 }]);
//!
//! let result = index.lookup("hel");
//! assert_eq!(result.suggestions()[0].text, "Hello");
//! ```

pub mod handler;
pub mod index;
pub mod refresher;
pub mod server;
pub mod source;
