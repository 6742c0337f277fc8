use axum::{
    async_trait,
    body::Body,
    extract::{
        multipart::MultipartRejection, rejection::FormRejection, FromRequest, Multipart, Query,
        Request, State,
    },
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::asr::{AudioUpload, Transcription};
use crate::error::RelayError;
use crate::state::AppState;
use crate::translate::{Direction, TranslateResponse};
use crate::tts::forward_audio;

#[derive(Debug, Default, Deserialize)]
pub struct IndexForm {
    #[serde(default)]
    pub sentence: String,
    #[serde(default)]
    pub languages: String,
}

/// Loose input of the `/translate` helper, accepted as JSON or form data.
/// The aliases are checked in order; the first non-empty one wins.
#[derive(Debug, Default, Deserialize)]
pub struct TranslateFields {
    pub sentence: Option<String>,
    pub text: Option<String>,
    pub languages: Option<String>,
    pub language: Option<String>,
}

impl TranslateFields {
    fn from_json(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            sentence: field("sentence"),
            text: field("text"),
            languages: field("languages"),
            language: field("language"),
        }
    }

    pub fn source_text(&self) -> &str {
        first_present(&self.sentence, &self.text).trim()
    }

    pub fn selector(&self) -> &str {
        first_present(&self.languages, &self.language).trim()
    }
}

fn first_present<'a>(primary: &'a Option<String>, fallback: &'a Option<String>) -> &'a str {
    [primary, fallback]
        .into_iter()
        .filter_map(|candidate| candidate.as_deref())
        .find(|value| !value.is_empty())
        .unwrap_or("")
}

#[async_trait]
impl<S> FromRequest<S> for TranslateFields
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        // Unparseable bodies read as empty, which then fails validation.
        let fields = if is_json {
            Json::<Value>::from_request(req, state)
                .await
                .map(|Json(value)| Self::from_json(&value))
                .unwrap_or_default()
        } else {
            Form::<Self>::from_request(req, state)
                .await
                .map(|Form(fields)| fields)
                .unwrap_or_default()
        };
        Ok(fields)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SpeakQuery {
    #[serde(default)]
    pub text: String,
}

async fn translate(
    state: &AppState,
    text: &str,
    direction: Direction,
) -> Result<String, RelayError> {
    state
        .translator
        .translate(text, direction)
        .await
        .map_err(|err| {
            error!("Translation {:?} failed: {}", direction, err);
            match err {
                RelayError::Translation(_) => err,
                other => RelayError::Translation(other.to_string()),
            }
        })
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.page.render(None))
}

/// Form submission of the page. An unknown direction, or a body that is not
/// a form at all, renders the page without a result instead of guessing.
pub async fn index_submit(
    State(state): State<AppState>,
    form: Result<Form<IndexForm>, FormRejection>,
) -> Result<Html<String>, RelayError> {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    let translated = match Direction::parse(&form.languages) {
        Some(direction) => Some(translate(&state, &form.sentence, direction).await?),
        None => {
            debug!("Page submitted with unrecognized direction {:?}", form.languages);
            None
        }
    };

    Ok(Html(state.page.render(translated.as_deref())))
}

pub async fn translate_text(
    State(state): State<AppState>,
    fields: TranslateFields,
) -> Result<Json<TranslateResponse>, RelayError> {
    let text = fields.source_text();
    if text.is_empty() {
        return Err(RelayError::validation("Missing sentence parameter"));
    }

    let direction = Direction::parse(fields.selector()).unwrap_or_else(|| {
        debug!(
            "Unrecognized direction {:?}, defaulting to {:?}",
            fields.selector(),
            Direction::default()
        );
        Direction::default()
    });

    let translated_text = translate(&state, text, direction).await?;
    Ok(Json(TranslateResponse { translated_text }))
}

pub async fn speech_to_text(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Transcription>, RelayError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("STT request without multipart body: {}", e);
        RelayError::validation("Missing audio file")
    })?;

    let upload = read_audio_field(&mut multipart).await?;
    let transcription = state.stt.transcribe(upload).await?;
    Ok(Json(transcription))
}

async fn read_audio_field(multipart: &mut Multipart) -> Result<AudioUpload, RelayError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RelayError::validation(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("audio") {
            continue;
        }

        // A part without a `filename` parameter is a plain form value, not an upload.
        let Some(filename) = field.file_name().map(str::to_string) else {
            debug!("Ignoring non-file `audio` part");
            continue;
        };
        let mime_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| RelayError::validation(format!("Failed to read audio file: {}", e)))?;

        return AudioUpload::new(Some(filename), bytes, mime_type);
    }

    Err(RelayError::validation("Missing audio file"))
}

/// Streams synthesized speech for `?text=`. Errors are plain text since the
/// consumer is usually an `<audio>` element.
pub async fn text_to_speech(
    State(state): State<AppState>,
    Query(query): Query<SpeakQuery>,
) -> Response {
    let text = query.text.trim();
    if text.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing ?text parameter").into_response();
    }

    match state.tts.open_stream(text).await {
        Ok(upstream) => {
            let body = Body::from_stream(forward_audio(upstream, state.config.speech.chunk_size));
            ([(CONTENT_TYPE, "audio/mpeg")], body).into_response()
        }
        Err(err) => {
            error!("TTS upstream failed: {}", err);
            (
                StatusCode::BAD_GATEWAY,
                format!("TTS error: {}", describe_tts_failure(&err)),
            )
                .into_response()
        }
    }
}

fn describe_tts_failure(err: &RelayError) -> String {
    match err {
        RelayError::UpstreamStatus { status, body } => match body.as_str() {
            Some(detail) if !detail.is_empty() => {
                format!("upstream returned status {}: {}", status, detail)
            }
            _ => format!("upstream returned status {}", status),
        },
        other => other.to_string(),
    }
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
