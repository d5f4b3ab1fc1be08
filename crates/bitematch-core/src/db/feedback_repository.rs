//! Feedback submissions kept on device

use crate::error::{Error, Result};
use crate::models::{Feedback, Mood};
use libsql::{Connection, Row, Value};

/// Trait for feedback storage operations (async)
#[allow(async_fn_in_trait)]
pub trait FeedbackRepository {
    /// Store a submission
    async fn save(&self, feedback: &Feedback) -> Result<()>;

    /// Submissions, newest first
    async fn list(&self, limit: usize) -> Result<Vec<Feedback>>;
}

/// libSQL implementation of `FeedbackRepository`
pub struct LibSqlFeedbackRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlFeedbackRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_row(row: &Row) -> Result<Feedback> {
        let id: String = row.get(0)?;
        let mood: i64 = row.get(1)?;
        let areas: String = row.get(2)?;
        let comment = match row.get_value(3)? {
            Value::Text(text) => Some(text),
            _ => None,
        };

        let mood = u8::try_from(mood)
            .map_err(|_| Error::Database(format!("invalid stored mood {mood}")))
            .and_then(Mood::try_from)?;

        Ok(Feedback {
            id: id
                .parse()
                .map_err(|e| Error::Database(format!("invalid feedback id: {e}")))?,
            mood,
            areas: serde_json::from_str(&areas)?,
            comment,
            created_at: row.get(4)?,
        })
    }
}

impl FeedbackRepository for LibSqlFeedbackRepository<'_> {
    async fn save(&self, feedback: &Feedback) -> Result<()> {
        let comment = feedback
            .comment
            .clone()
            .map_or(Value::Null, Value::Text);

        self.conn
            .execute(
                "INSERT INTO feedback (id, mood, areas, comment, created_at) VALUES (?, ?, ?, ?, ?)",
                vec![
                    Value::Text(feedback.id.to_string()),
                    Value::Integer(i64::from(u8::from(feedback.mood))),
                    Value::Text(serde_json::to_string(&feedback.areas)?),
                    comment,
                    Value::Integer(feedback.created_at),
                ],
            )
            .await?;

        tracing::info!("Saved feedback {}", feedback.id);
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<Feedback>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = self
            .conn
            .query(
                "SELECT id, mood, areas, comment, created_at FROM feedback
                 ORDER BY created_at DESC, id DESC LIMIT ?",
                [limit],
            )
            .await?;

        let mut submissions = Vec::new();
        while let Some(row) = rows.next().await? {
            submissions.push(Self::parse_row(&row)?);
        }
        Ok(submissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::ImprovementArea;
    use pretty_assertions::assert_eq;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_and_list_feedback() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlFeedbackRepository::new(db.connection());

        let first = Feedback::new(Mood::Happy, [ImprovementArea::AppSpeed], None).unwrap();
        let second = Feedback::new(
            Mood::Loved,
            [ImprovementArea::SwipeLogic, ImprovementArea::Matches],
            Some("Great picks".to_string()),
        )
        .unwrap();

        repo.save(&first).await.unwrap();
        repo.save(&second).await.unwrap();

        let listed = repo.list(10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.contains(&first));
        assert!(listed.contains(&second));

        assert_eq!(repo.list(1).await.unwrap().len(), 1);
    }
}
