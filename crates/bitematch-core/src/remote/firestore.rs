//! Firestore REST implementation of `RemoteStore`

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{
    parse_api_error, RemoteError, RemoteResult, RemoteSnapshot, RemoteStore, UserContext,
    INITIAL_INTERACTION_LIMIT, INITIAL_MATCH_LIMIT,
};
use crate::models::{Candidate, CandidateId, Decision, Match, Outcome, PriceLevel};
use crate::util::{is_http_url, normalize_text_option};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Firestore rejects commits with more writes than this
const MAX_BATCH_WRITES: usize = 500;

const USERS: &str = "users";
const MATCHES: &str = "matches";
const INTERACTIONS: &str = "interactions";

#[derive(Clone)]
pub struct FirestoreStore {
    base_url: String,
    project_id: String,
    client: reqwest::Client,
}

impl FirestoreStore {
    pub fn new(project_id: impl Into<String>) -> RemoteResult<Self> {
        Self::with_base_url(FIRESTORE_BASE_URL, project_id)
    }

    /// Point the store at another endpoint, e.g. the Firestore emulator
    pub fn with_base_url(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
    ) -> RemoteResult<Self> {
        let base_url = normalize_text_option(Some(base_url.into())).ok_or_else(|| {
            RemoteError::InvalidConfiguration("base URL must not be empty".to_string())
        })?;
        if !is_http_url(&base_url) {
            return Err(RemoteError::InvalidConfiguration(
                "base URL must include http:// or https://".to_string(),
            ));
        }
        let project_id = normalize_text_option(Some(project_id.into())).ok_or_else(|| {
            RemoteError::InvalidConfiguration("project id must not be empty".to_string())
        })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            client: reqwest::Client::builder().build()?,
        })
    }

    fn documents_root(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn document_name(&self, segments: &[&str]) -> String {
        format!("{}/{}", self.documents_root(), segments.join("/"))
    }

    async fn commit(&self, user: &UserContext, writes: Vec<Value>) -> RemoteResult<()> {
        if writes.len() > MAX_BATCH_WRITES {
            tracing::debug!(
                "Splitting {} writes into commits of {MAX_BATCH_WRITES}",
                writes.len()
            );
        }

        let url = format!("{}/{}:commit", self.base_url, self.documents_root());
        for chunk in writes.chunks(MAX_BATCH_WRITES) {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&user.id_token)
                .json(&json!({ "writes": chunk }))
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(RemoteError::Api(parse_api_error(status, &body)));
            }
        }
        Ok(())
    }

    async fn run_query(
        &self,
        user: &UserContext,
        structured_query: Value,
    ) -> RemoteResult<Vec<Document>> {
        let url = format!(
            "{}/{}/{USERS}/{}:runQuery",
            self.base_url,
            self.documents_root(),
            urlencoding::encode(&user.uid)
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&user.id_token)
            .json(&json!({ "structuredQuery": structured_query }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api(parse_api_error(status, &body)));
        }

        let items = response.json::<Vec<RunQueryItem>>().await?;
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }
}

impl RemoteStore for FirestoreStore {
    async fn save_interaction(
        &self,
        user: &UserContext,
        candidate_id: &CandidateId,
        outcome: Outcome,
    ) -> RemoteResult<()> {
        let name = self.document_name(&[USERS, &user.uid, INTERACTIONS, candidate_id.as_str()]);
        self.commit(user, vec![interaction_write(&name, outcome)])
            .await
    }

    async fn save_match(&self, user: &UserContext, candidate: &Candidate) -> RemoteResult<()> {
        let name = self.document_name(&[USERS, &user.uid, MATCHES, candidate.id.as_str()]);
        self.commit(user, vec![match_write(&name, candidate)]).await
    }

    async fn delete_match(&self, user: &UserContext, candidate_id: &CandidateId) -> RemoteResult<()> {
        let writes = vec![
            json!({ "delete": self.document_name(&[USERS, &user.uid, MATCHES, candidate_id.as_str()]) }),
            json!({ "delete": self.document_name(&[USERS, &user.uid, INTERACTIONS, candidate_id.as_str()]) }),
        ];
        self.commit(user, writes).await
    }

    async fn fetch_initial_data(&self, user: &UserContext) -> RemoteResult<RemoteSnapshot> {
        let (match_docs, interaction_docs) = tokio::try_join!(
            self.run_query(
                user,
                ordered_query(MATCHES, "syncedAt", INITIAL_MATCH_LIMIT)
            ),
            self.run_query(
                user,
                ordered_query(INTERACTIONS, "timestamp", INITIAL_INTERACTION_LIMIT)
            ),
        )?;

        let matches = match_docs
            .iter()
            .map(decode_match)
            .collect::<RemoteResult<Vec<_>>>()?;
        let interactions = interaction_docs
            .iter()
            .map(decode_interaction)
            .collect::<RemoteResult<Vec<_>>>()?;

        tracing::debug!(
            "Fetched {} matches and {} interactions for {}",
            matches.len(),
            interactions.len(),
            user.uid
        );
        Ok(RemoteSnapshot {
            matches,
            interactions,
        })
    }

    async fn purge_user_data(&self, user: &UserContext) -> RemoteResult<()> {
        let (match_docs, interaction_docs) = tokio::try_join!(
            self.run_query(user, names_query(MATCHES)),
            self.run_query(user, names_query(INTERACTIONS)),
        )?;

        let mut writes: Vec<Value> = match_docs
            .into_iter()
            .chain(interaction_docs)
            .map(|doc| json!({ "delete": doc.name }))
            .collect();
        writes.push(json!({ "delete": self.document_name(&[USERS, &user.uid]) }));

        tracing::info!("Purging {} remote documents for {}", writes.len(), user.uid);
        self.commit(user, writes).await
    }
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl Document {
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

fn ordered_query(collection: &str, field: &str, limit: usize) -> Value {
    json!({
        "from": [{ "collectionId": collection }],
        "orderBy": [{ "field": { "fieldPath": field }, "direction": "DESCENDING" }],
        "limit": limit,
    })
}

fn names_query(collection: &str) -> Value {
    json!({
        "from": [{ "collectionId": collection }],
        "select": { "fields": [{ "fieldPath": "__name__" }] },
    })
}

fn interaction_write(name: &str, outcome: Outcome) -> Value {
    json!({
        "update": {
            "name": name,
            "fields": { "type": { "stringValue": outcome.as_str() } },
        },
        "updateTransforms": [{ "fieldPath": "timestamp", "setToServerValue": "REQUEST_TIME" }],
    })
}

fn match_write(name: &str, candidate: &Candidate) -> Value {
    let mut fields = Map::new();
    fields.insert("id".into(), json!({ "stringValue": candidate.id.as_str() }));
    fields.insert("name".into(), json!({ "stringValue": candidate.name }));
    if let Some(rating) = candidate.rating {
        fields.insert("rating".into(), json!({ "doubleValue": rating }));
    }
    if let Some(total) = candidate.user_ratings_total {
        // integerValue is a string on the wire
        fields.insert(
            "user_ratings_total".into(),
            json!({ "integerValue": total.to_string() }),
        );
    }
    if let Some(address) = &candidate.address {
        fields.insert("address".into(), json!({ "stringValue": address }));
    }
    if let Some(photo) = &candidate.photo_reference {
        fields.insert("photo_reference".into(), json!({ "stringValue": photo }));
    }
    if let Some(level) = candidate.price_level {
        fields.insert(
            "price_level".into(),
            json!({ "integerValue": level.value().to_string() }),
        );
    }

    json!({
        "update": { "name": name, "fields": fields },
        "updateTransforms": [{ "fieldPath": "syncedAt", "setToServerValue": "REQUEST_TIME" }],
    })
}

fn decode_match(doc: &Document) -> RemoteResult<Match> {
    let id = string_field(&doc.fields, "id").unwrap_or_else(|| doc.id().to_string());
    let id = CandidateId::new(id)
        .map_err(|e| RemoteError::InvalidPayload(format!("match {}: {e}", doc.name)))?;
    let name = string_field(&doc.fields, "name")
        .ok_or_else(|| RemoteError::InvalidPayload(format!("match {} has no name", doc.name)))?;

    let mut candidate = Candidate::new(id, name);
    candidate.rating = double_field(&doc.fields, "rating");
    candidate.user_ratings_total = integer_field(&doc.fields, "user_ratings_total")
        .and_then(|total| u32::try_from(total).ok());
    candidate.address = string_field(&doc.fields, "address");
    candidate.photo_reference = string_field(&doc.fields, "photo_reference");
    candidate.price_level = integer_field(&doc.fields, "price_level")
        .and_then(|level| u8::try_from(level).ok())
        .and_then(PriceLevel::new);

    Ok(Match {
        candidate,
        matched_at: timestamp_field(&doc.fields, "syncedAt").unwrap_or_default(),
    })
}

fn decode_interaction(doc: &Document) -> RemoteResult<Decision> {
    let candidate_id = CandidateId::new(doc.id())
        .map_err(|e| RemoteError::InvalidPayload(format!("interaction {}: {e}", doc.name)))?;
    let raw = string_field(&doc.fields, "type").ok_or_else(|| {
        RemoteError::InvalidPayload(format!("interaction {} has no type", doc.name))
    })?;
    let outcome = raw.parse::<Outcome>().map_err(|_| {
        RemoteError::InvalidPayload(format!("interaction {} has type '{raw}'", doc.name))
    })?;

    Ok(Decision {
        candidate_id,
        outcome,
        decided_at: timestamp_field(&doc.fields, "timestamp").unwrap_or_default(),
    })
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)?
        .get("stringValue")?
        .as_str()
        .map(str::to_string)
}

fn integer_field(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = fields.get(key)?.get("integerValue")?;
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|raw| raw.parse().ok()))
}

#[allow(clippy::cast_precision_loss)]
fn double_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = fields.get(key)?;
    value
        .get("doubleValue")
        .and_then(Value::as_f64)
        .or_else(|| integer_field(fields, key).map(|whole| whole as f64))
}

/// Unix ms of a timestampValue
fn timestamp_field(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    let raw = fields.get(key)?.get("timestampValue")?.as_str()?;
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|timestamp| timestamp.timestamp_millis())
}
