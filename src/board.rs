//! Kanban job board for trades
//!
//! Jobs are grouped into three fixed columns by status. Dropping a card on
//! another column moves it there straight away and yields the single status
//! change to send; [`JobBoard`] sends it and reports the outcome.

use std::sync::Arc;

use crate::api::MarketplaceApi;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::Result;
use crate::forms::JobForm;
use crate::models::{Job, JobStatus, JobStatusUpdate, RowId};
use crate::notify::Notifier;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub status: JobStatus,
    pub items: Vec<Job>,
    visible: usize,
}

impl Column {
    fn new(status: JobStatus, items: Vec<Job>, visible: usize) -> Self {
        Self {
            status,
            items,
            visible,
        }
    }

    pub fn name(&self) -> &'static str {
        self.status.column_name()
    }

    pub fn visible_count(&self) -> usize {
        self.visible
    }

    pub fn visible_items(&self) -> &[Job] {
        &self.items[..self.visible.min(self.items.len())]
    }

    /// Whether "Load more" is offered.
    pub fn has_more(&self) -> bool {
        self.items.len() > self.visible
    }

    fn contains(&self, job_id: RowId) -> bool {
        self.items.iter().any(|job| job.id == job_id)
    }
}

/// What a card is being dragged over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Column(JobStatus),
    Card(RowId),
}

#[derive(Debug, Clone)]
pub struct Board {
    columns: Vec<Column>,
    page_size: usize,
    active: Option<RowId>,
    over: Option<DragTarget>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Board {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            columns: JobStatus::ALL
                .into_iter()
                .map(|status| Column::new(status, Vec::new(), page_size))
                .collect(),
            page_size,
            active: None,
            over: None,
        }
    }

    pub fn with_jobs(page_size: usize, jobs: Vec<Job>) -> Self {
        let mut board = Self::new(page_size);
        board.load(jobs);
        board
    }

    /// Replaces every column from fresh rows and resets the visible counts.
    pub fn load(&mut self, jobs: Vec<Job>) {
        for column in &mut self.columns {
            column.items.clear();
            column.visible = self.page_size;
        }
        for job in jobs {
            if let Some(column) = self.columns.iter_mut().find(|c| c.status == job.status) {
                column.items.push(job);
            }
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, status: JobStatus) -> &Column {
        // Built from JobStatus::ALL, so every status has a column.
        &self.columns[JobStatus::ALL
            .iter()
            .position(|s| *s == status)
            .unwrap_or_default()]
    }

    pub fn load_more(&mut self, status: JobStatus) {
        let page_size = self.page_size;
        if let Some(column) = self.columns.iter_mut().find(|c| c.status == status) {
            column.visible = (column.visible + page_size).min(column.items.len());
        }
    }

    pub fn drag_start(&mut self, job_id: RowId) {
        self.active = Some(job_id);
    }

    pub fn drag_over(&mut self, target: Option<DragTarget>) {
        self.over = target;
    }

    /// The card being dragged, for the drag overlay.
    pub fn active_job(&self) -> Option<&Job> {
        let id = self.active?;
        self.columns
            .iter()
            .flat_map(|c| c.items.iter())
            .find(|job| job.id == id)
    }

    /// Finishes a drag. Returns the status change to persist, or `None`
    /// when the card was dropped nowhere or back on its own column.
    pub fn drag_end(&mut self, over: Option<DragTarget>) -> Option<JobStatusUpdate> {
        let active = self.active.take();
        let hovered = self.over.take();
        let job_id = active?;
        let target = over.or(hovered)?;

        let source = self.columns.iter().position(|c| c.contains(job_id))?;
        let dest = self.columns.iter().position(|c| match target {
            DragTarget::Column(status) => c.status == status,
            DragTarget::Card(card) => c.contains(card),
        })?;
        if source == dest {
            return None;
        }

        let index = self.columns[source]
            .items
            .iter()
            .position(|job| job.id == job_id)?;
        let mut job = self.columns[source].items.remove(index);
        let status = self.columns[dest].status;
        job.status = status;
        self.columns[dest].items.push(job);

        tracing::debug!(job_id, %status, "job card moved");
        Some(JobStatusUpdate { job_id, status })
    }
}

/// The board screen: columns, the "Add Job" dialog and their requests.
pub struct JobBoard {
    api: Arc<dyn MarketplaceApi>,
    notifier: Notifier,
    pub board: Board,
    pub form: JobForm,
}

impl JobBoard {
    pub fn new(api: Arc<dyn MarketplaceApi>, notifier: Notifier, page_size: usize) -> Self {
        Self {
            api,
            notifier,
            board: Board::new(page_size),
            form: JobForm::new(),
        }
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let jobs = self.api.fetch_jobs().await?;
        self.board.load(jobs);
        Ok(())
    }

    /// Drops the dragged card and persists its new status. A failed update
    /// keeps the card where it was dropped until the next refresh. Once the
    /// update is saved the move counts as done even if the refetch fails.
    pub async fn drop_card(&mut self, over: Option<DragTarget>) -> Result<Option<JobStatusUpdate>> {
        let Some(change) = self.board.drag_end(over) else {
            return Ok(None);
        };

        self.notifier.success(
            &format!("Job moved to {}", change.status.column_name()),
            None,
        );
        if let Err(err) = self.api.update_job_status(change).await {
            tracing::warn!(job_id = change.job_id, error = %err, "job status update failed");
            self.notifier.error("Failed to update job status", None);
            return Err(err);
        }

        // The move is saved; a stale board is fixed by the next refresh.
        if let Err(err) = self.refresh().await {
            tracing::warn!(job_id = change.job_id, error = %err, "board refresh after move failed");
        }
        Ok(Some(change))
    }

    pub async fn add_job(&mut self) -> Result<()> {
        let job = match self.form.to_new_job() {
            Ok(job) => job,
            Err(err) => {
                self.notifier.error("Please fill required fields", None);
                return Err(err);
            }
        };

        if let Err(err) = self.api.post_jobs(&job).await {
            tracing::warn!(error = %err, "job insert failed");
            self.notifier.error("Error! Try again", None);
            return Err(err);
        }
        self.notifier.success("Job added successfully", None);
        self.form.reset();
        self.refresh().await
    }
}
