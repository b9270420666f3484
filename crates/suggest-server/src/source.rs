//! Источники данных для индекса подсказок.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use suggest_common::{RawRecord, SourceError};

/// Поставщик полного списка записей для очередного цикла обновления.
///
/// Реализован для [`JsonFileSource`] и для любого замыкания с подходящей
/// сигнатурой, что удобно в тестах.
pub trait DataSource: Send + Sync {
    /// Возвращает все записи источника или ошибку; частичный результат недопустим.
    fn fetch(&self) -> Result<Vec<RawRecord>, SourceError>;
}

impl<F> DataSource for F
where
    F: Fn() -> Result<Vec<RawRecord>, SourceError> + Send + Sync,
{
    fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        self()
    }
}

/// JSON-файл с массивом объектов `{"id", "name", "cost"}`, перечитываемый при
/// каждом вызове [`fetch`](DataSource::fetch).
///
/// # Примеры
///
/// ```
/// use std::io::Write;
///
/// use suggest_server::source::{DataSource, JsonFileSource};
///
/// let mut file = tempfile::NamedTempFile::new().unwrap();
/// write!(file, r#"[{{"id": "hel", "name": "Hello", "cost": 5}}]"#).unwrap();
///
/// let records = JsonFileSource::new(file.path()).fetch().unwrap();
/// assert_eq!(records[0].name, "Hello");
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for JsonFileSource {
    fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        let file = File::open(&self.path)
            .map_err(|source| SourceError::Io { path: self.path.clone(), source })?;
        // Одна некорректная запись делает недействительным весь файл.
        serde_json::from_reader(BufReader::new(file))
            .map_err(|source| SourceError::Parse { path: self.path.clone(), source })
    }
}
