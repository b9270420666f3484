//! Фоновое обновление индекса — периодически перечитывает источник и
//! устанавливает новый снимок.
//!
//! Цикл: `Idle → Fetching → Installing → Idle`. Первый цикл выполняется сразу
//! при запуске, следующий — через фиксированный интервал после окончания
//! предыдущего. Ошибка источника только логируется: установленный ранее
//! снимок остаётся в силе.

use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use suggest_common::SourceError;
use tracing::{debug, error, info};

use crate::{index::SuggestionIndex, source::DataSource};

/// Поток обновления: источник, индекс и пауза между циклами.
pub struct Refresher<S> {
    source: S,
    index: Arc<SuggestionIndex>,
    interval: Duration,
}

impl<S: DataSource + 'static> Refresher<S> {
    pub fn new(source: S, index: Arc<SuggestionIndex>, interval: Duration) -> Self {
        Self { source, index, interval }
    }

    /// Выполняет один цикл обновления и возвращает номер установленного поколения.
    ///
    /// При ошибке источника индекс не трогается.
    ///
    /// # Примеры
    ///
    /// ```
    /// use std::{sync::Arc, time::Duration};
    ///
    /// use suggest_common::{RawRecord, SourceError};
    /// use suggest_server::{index::SuggestionIndex, refresher::Refresher};
    ///
    /// let index = Arc::new(SuggestionIndex::new());
    /// let source = || -> Result<Vec<RawRecord>, SourceError> {
    ///     Ok(vec![RawRecord { id: "hel".into(), name: "Hello".into(), cost: 5.0 }])
    /// };
    ///
    /// let refresher = Refresher::new(source, Arc::clone(&index), Duration::from_secs(900));
    /// assert_eq!(refresher.run_cycle().unwrap(), 1);
    /// assert!(!index.lookup("hel").is_empty());
    /// ```
    pub fn run_cycle(&self) -> Result<u64, SourceError> {
        debug!("fetching suggestions");
        let records = self.source.fetch()?;
        let count = records.len();

        debug!(count, "installing suggestions");
        let generation = self.index.install(records);
        info!(count, generation, "suggestions updated");
        Ok(generation)
    }

    /// Запускает бесконечный цикл обновления в отдельном потоке `refresher`.
    ///
    /// Поток останавливается через [`RefresherHandle::stop`] или при удалении
    /// дескриптора; пауза между циклами при этом прерывается сразу.
    pub fn spawn(self) -> io::Result<RefresherHandle> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let thread = thread::Builder::new()
            .name("refresher".into())
            .spawn(move || self.run(&stop_rx))?;
        Ok(RefresherHandle { stop: stop_tx, thread })
    }

    fn run(&self, stop: &Receiver<()>) {
        info!(interval_secs = self.interval.as_secs(), "refresher started");
        loop {
            if let Err(e) = self.run_cycle() {
                error!(%e, "refresh failed, keeping previous suggestions");
            }

            match stop.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        info!("refresher stopped");
    }
}

/// Дескриптор запущенного потока обновления.
pub struct RefresherHandle {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

impl RefresherHandle {
    /// Прерывает паузу, дожидается окончания текущего цикла и завершения потока.
    pub fn stop(self) -> thread::Result<()> {
        // Канал может быть уже заполнен или закрыт — поток всё равно выйдет.
        let _ = self.stop.try_send(());
        self.thread.join()
    }
}
