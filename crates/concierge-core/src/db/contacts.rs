//! Contact submission storage

use super::Database;
use crate::error::Result;
use crate::knowledge::{new_record_id, ContactRepository, ContactSubmission};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;
use serde::Serialize;

/// Stored contact submission
#[derive(Debug, Clone, Serialize)]
pub struct ContactRecord {
    pub id: String,
    pub created_at: String,
    #[serde(flatten)]
    pub submission: ContactSubmission,
}

impl Database {
    pub fn insert_contact(&self, submission: &ContactSubmission) -> Result<String> {
        let id = new_record_id(&submission.email);
        self.conn().execute(
            "INSERT INTO contacts
                (id, name, email, company, phone, product, inquiry_type, message, source, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                submission.name,
                submission.email,
                submission.company,
                submission.phone,
                submission.product,
                submission.inquiry_type,
                submission.message,
                submission.source.as_deref().unwrap_or("website"),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(id)
    }

    /// Contact submissions, newest first
    pub fn list_contacts(&self) -> Result<Vec<ContactRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, created_at, name, email, company, phone, product, inquiry_type, message, source
             FROM contacts ORDER BY created_at DESC, id",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(ContactRecord {
                    id: row.get(0)?,
                    created_at: row.get(1)?,
                    submission: ContactSubmission {
                        name: row.get(2)?,
                        email: row.get(3)?,
                        company: row.get(4)?,
                        phone: row.get(5)?,
                        product: row.get(6)?,
                        inquiry_type: row.get(7)?,
                        message: row.get(8)?,
                        source: row.get(9)?,
                    },
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

#[async_trait]
impl ContactRepository for Database {
    async fn create(&self, submission: ContactSubmission) -> Result<String> {
        self.insert_contact(&submission)
    }
}
