//! Monotonic table/image cursors, job-scoped.
//!
//! One `Cursors` value is created per job and owned exclusively by the
//! rule engine for that job's duration. Every table copy and every figure
//! insertion consumes exactly one position, in rule-execution order; that
//! positional discipline is the only thing keeping output references
//! aligned with the source, since no content-based matching happens.
//!
//! Consumption past the available count is a structural mismatch and
//! fails the job. Reading out of range silently is never an option.

use crate::error::{JobError, Resource};

/// Two strictly non-decreasing indexes into the source's table and image
/// sequences.
#[derive(Debug)]
pub struct Cursors {
    table: usize,
    image: usize,
    table_count: usize,
    image_count: usize,
}

impl Cursors {
    /// Start both cursors at the configured first usable indexes.
    pub fn new(
        first_table: usize,
        first_image: usize,
        table_count: usize,
        image_count: usize,
    ) -> Self {
        Cursors {
            table: first_table,
            image: first_image,
            table_count,
            image_count,
        }
    }

    /// Consume the next table position.
    pub fn take_table(&mut self) -> Result<usize, JobError> {
        if self.table >= self.table_count {
            return Err(JobError::StructuralMismatch {
                resource: Resource::Table,
                wanted: self.table,
                available: self.table_count,
            });
        }
        let taken = self.table;
        self.table += 1;
        Ok(taken)
    }

    /// Consume the next image position.
    pub fn take_image(&mut self) -> Result<usize, JobError> {
        if self.image >= self.image_count {
            return Err(JobError::StructuralMismatch {
                resource: Resource::Image,
                wanted: self.image,
                available: self.image_count,
            });
        }
        let taken = self.image;
        self.image += 1;
        Ok(taken)
    }

    /// Current table position (next index to be consumed).
    pub fn table_position(&self) -> usize {
        self.table
    }

    /// Current image position (next index to be consumed).
    pub fn image_position(&self) -> usize {
        self.image
    }
}
