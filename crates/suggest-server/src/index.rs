//! Индекс подсказок — активный ранжированный снимок и поиск по нему.
//!
//! Снимок ([`Snapshot`]) неизменяем и разделяется через `Arc`. Обновление
//! строит новый снимок целиком и подменяет ссылку под мьютексом, поэтому
//! читатель всегда видит либо старый, либо новый снимок полностью.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use suggest_common::{RawRecord, SuggestResult, Suggestion};

/// Неизменяемый ранжированный набор записей одного поколения.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Записи, отсортированные по `cost` по убыванию.
    records: Vec<RawRecord>,
    /// Номер установки: 0 — пустой стартовый снимок.
    generation: u64,
}

/// Запись, совпавшая с запросом, и её место среди совпадений.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedRecord<'a> {
    pub record: &'a RawRecord,
    /// Позиция среди совпадений данного запроса (с нуля).
    pub rank: usize,
}

impl Snapshot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Совпадения по точному `id` в порядке ранга.
    ///
    /// Ранг считается по совпадениям, а не по позиции в снимке.
    pub fn matches<'a>(&'a self, id: &'a str) -> impl Iterator<Item = RankedRecord<'a>> + 'a {
        self.records
            .iter()
            .filter(move |record| record.id == id)
            .enumerate()
            .map(|(rank, record)| RankedRecord { record, rank })
    }

    /// Собирает ответ на запрос `id`; без совпадений — [`SuggestResult::Empty`].
    pub fn lookup(&self, id: &str) -> SuggestResult {
        self.matches(id)
            .map(|ranked| Suggestion { text: ranked.record.name.clone(), position: ranked.rank })
            .collect::<Vec<_>>()
            .into()
    }
}

/// Разделяемый индекс подсказок.
///
/// Пишет только поток обновления ([`install`](SuggestionIndex::install)),
/// читают все обработчики запросов ([`lookup`](SuggestionIndex::lookup)).
///
/// # Примеры
///
/// ```
/// use suggest_common::{RawRecord, SuggestResult};
/// use suggest_server::index::SuggestionIndex;
///
/// let index = SuggestionIndex::new();
/// assert_eq!(index.lookup("hel"), SuggestResult::Empty);
///
/// let generation = index.install(vec![
///     RawRecord { id: "hel".into(), name: "Help".into(), cost: 2.0 },
///     RawRecord { id: "hel".into(), name: "Hello".into(), cost: 5.0 },
/// ]);
/// assert_eq!(generation, 1);
///
/// let result = index.lookup("hel");
/// let names: Vec<_> = result.suggestions().iter().map(|s| s.text.as_str()).collect();
/// assert_eq!(names, ["Hello", "Help"]);
/// ```
#[derive(Debug, Default)]
pub struct SuggestionIndex {
    active: Mutex<Arc<Snapshot>>,
}

impl SuggestionIndex {
    /// Создаёт индекс с пустым снимком поколения 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ранжирует `records` и атомарно делает их активным снимком.
    ///
    /// Сортировка выполняется до захвата блокировки; под блокировкой только
    /// подменяется ссылка. Возвращает номер нового поколения.
    pub fn install(&self, mut records: Vec<RawRecord>) -> u64 {
        rank_by_cost(&mut records);

        let mut active = self.lock();
        let generation = active.generation + 1;
        let previous = std::mem::replace(&mut *active, Arc::new(Snapshot { records, generation }));
        drop(active);
        // Старый снимок освобождается уже без блокировки.
        drop(previous);
        generation
    }

    /// Текущий активный снимок.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.lock())
    }

    /// Ищет записи с `id`, равным `input`, в активном снимке.
    pub fn lookup(&self, input: &str) -> SuggestResult {
        self.snapshot().lookup(input)
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Arc<Snapshot>> {
        // Под мьютексом всегда лежит целый снимок, поэтому отравление безопасно игнорировать.
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Стабильная сортировка по `cost` по убыванию: равные сохраняют исходный порядок.
pub fn rank_by_cost(records: &mut [RawRecord]) {
    records.sort_by(|a, b| b.cost.total_cmp(&a.cost));
}
