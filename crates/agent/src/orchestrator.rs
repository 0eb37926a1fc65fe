use futures::StreamExt;
use peditor_core::logging::{PrivacyConfig, mask_credential, redact_sensitive};
use peditor_core::notice::messages;
use peditor_core::*;
use peditor_providers::{CancelToken, GenerationRequest, GenerationResult, Provider};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{Instrument, debug, info, info_span, warn};

/// Output entry written when a generation is requested without an API key
pub const MISSING_KEY_MESSAGE: &str = "Please enter an API key first.";

/// Prefix of the output entry that replaces a failed generation
pub const FAILURE_PREFIX: &str = "An error occurred while processing your request: ";

/// Monotonic identifier of one generation; a stream whose id is no longer the active one is stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationId(u64);

impl GenerationId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Lifecycle of an output slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Pending,
    Streaming,
    Complete,
    Failed,
    Cancelled,
}

impl SlotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotState::Pending => "pending",
            SlotState::Streaming => "streaming",
            SlotState::Complete => "complete",
            SlotState::Failed => "failed",
            SlotState::Cancelled => "cancelled",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SlotState::Complete | SlotState::Failed | SlotState::Cancelled)
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The output entry a generation writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSlot {
    pub id: GenerationId,
    /// Index in the output history at creation
    pub index: usize,
    pub state: SlotState,
}

/// What the orchestrator is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    Idle,
    Streaming { id: GenerationId, slot: usize },
}

impl GenerationStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, GenerationStatus::Idle)
    }
}

/// Result of asking for a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Started(GenerationId),
    /// Another generation is in flight; nothing changed
    Busy,
    /// Nothing to transform; nothing changed
    EmptyInput,
    /// The missing-key message was appended to the outputs instead
    MissingCredential,
}

impl SubmitOutcome {
    /// Transient message to show for outcomes that did not start a stream
    pub fn notice(&self) -> Option<Notice> {
        match self {
            SubmitOutcome::Started(_) => None,
            SubmitOutcome::Busy => Some(Notice::warning(messages::BUSY)),
            SubmitOutcome::EmptyInput => Some(Notice::warning(messages::EMPTY_INPUT)),
            SubmitOutcome::MissingCredential => Some(Notice::error(messages::API_KEY_REQUIRED)),
        }
    }
}

struct ActiveGeneration {
    id: GenerationId,
    index: usize,
    state: SlotState,
    cancel: CancelToken,
    started: Instant,
}

impl ActiveGeneration {
    fn slot(&self) -> GenerationSlot {
        GenerationSlot { id: self.id, index: self.index, state: self.state }
    }
}

#[derive(Default)]
struct State {
    active: Option<ActiveGeneration>,
    last: Option<GenerationSlot>,
}

/// State shared between the orchestrator handle and its driver tasks.
///
/// The state lock is held across the epoch check and the history write, so once `cancel`
/// returns no superseded stream can touch the output history.
struct Shared {
    histories: Arc<HistoryStore>,
    state: Mutex<State>,
    status: watch::Sender<GenerationStatus>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `fragment` to the slot if `id` is still the active generation.
    fn apply_fragment(&self, id: GenerationId, fragment: &str) -> bool {
        let mut state = self.lock();
        let Some(active) = state.active.as_mut().filter(|a| a.id == id) else {
            debug!(generation_id = %id, "Discarding stale fragment");
            return false;
        };

        if !self.histories.append_to_entry(HistoryKind::Output, active.index, fragment) {
            warn!(generation_id = %id, slot = active.index, "Output slot disappeared while streaming");
            return false;
        }

        if active.state == SlotState::Pending {
            active.state = SlotState::Streaming;
        }
        state.last = state.active.as_ref().map(ActiveGeneration::slot);
        true
    }

    /// Settle the generation `id`, optionally replacing the slot content. Stale ids are ignored.
    fn finish(&self, id: GenerationId, outcome: SlotState, replacement: Option<String>) -> Option<GenerationSlot> {
        let mut state = self.lock();
        if state.active.as_ref().is_none_or(|a| a.id != id) {
            return None;
        }
        let mut active = state.active.take()?;

        if let Some(text) = replacement {
            self.histories.replace_at(HistoryKind::Output, active.index, text);
        }
        active.state = outcome;

        let slot = active.slot();
        state.last = Some(slot);
        self.status.send_replace(GenerationStatus::Idle);

        info!(
            generation_id = %id,
            slot = slot.index,
            state = %slot.state,
            elapsed_ms = active.started.elapsed().as_millis() as u64,
            "Generation finished"
        );
        Some(slot)
    }
}

/// Runs template invocations against a provider and streams the results into the output history
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    histories: Arc<HistoryStore>,
    settings: Arc<SettingsContext>,
    shared: Arc<Shared>,
    next_id: AtomicU64,
    timeout: Option<Duration>,
    privacy: PrivacyConfig,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn Provider>, histories: Arc<HistoryStore>, settings: Arc<SettingsContext>) -> Self {
        let (status, _rx) = watch::channel(GenerationStatus::Idle);
        let shared = Arc::new(Shared { histories: Arc::clone(&histories), state: Mutex::new(State::default()), status });
        Self {
            provider,
            histories,
            settings,
            shared,
            next_id: AtomicU64::new(1),
            timeout: None,
            privacy: PrivacyConfig::default(),
        }
    }

    /// Fail a generation when the provider stays silent for longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Controls how much prompt text reaches the logs
    pub fn with_privacy(mut self, privacy: PrivacyConfig) -> Self {
        self.privacy = privacy;
        self
    }

    pub fn histories(&self) -> &Arc<HistoryStore> {
        &self.histories
    }

    pub fn settings(&self) -> &Arc<SettingsContext> {
        &self.settings
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Render `template` over the current input and stream the result into a new output entry.
    ///
    /// `option` overrides the stored selection for group templates. Must be called from within
    /// a Tokio runtime.
    pub fn submit(&self, template: &Template, option: Option<&str>) -> SubmitOutcome {
        if let Some(outcome) = self.check_ready() {
            return outcome;
        }

        let input = self.histories.current_value(HistoryKind::Input);
        if input.trim().is_empty() {
            return SubmitOutcome::EmptyInput;
        }

        let option = option.or_else(|| self.settings.selected_option(template));
        let prompt = build_prompt(template, &input, option);
        debug!(template = template.title(), option = ?option, "Submitting template");
        self.start(prompt)
    }

    /// Stream an already rendered prompt into a new output entry.
    pub fn submit_prompt(&self, prompt: impl Into<String>) -> SubmitOutcome {
        if let Some(outcome) = self.check_ready() {
            return outcome;
        }

        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return SubmitOutcome::EmptyInput;
        }
        self.start(prompt)
    }

    /// Busy and missing-key guards. Both run before the input is looked at, so a missing key is
    /// reported even when there is nothing to transform.
    fn check_ready(&self) -> Option<SubmitOutcome> {
        let mut state = self.shared.lock();
        self.guard(&mut state)
    }

    fn guard(&self, state: &mut State) -> Option<SubmitOutcome> {
        if state.active.is_some() {
            debug!("Generation already in flight");
            return Some(SubmitOutcome::Busy);
        }

        if !self.settings.has_credential() {
            let id = GenerationId(self.next_id.fetch_add(1, Ordering::SeqCst));
            let index = self.histories.append(HistoryKind::Output, MISSING_KEY_MESSAGE);
            state.last = Some(GenerationSlot { id, index, state: SlotState::Complete });
            warn!(generation_id = %id, "No API key configured");
            return Some(SubmitOutcome::MissingCredential);
        }
        None
    }

    fn start(&self, prompt: String) -> SubmitOutcome {
        let settings = self.settings.current();
        let mut state = self.shared.lock();

        if let Some(outcome) = self.guard(&mut state) {
            return outcome;
        }

        let id = GenerationId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let index = self.histories.append(HistoryKind::Output, "");
        let cancel = CancelToken::new();
        let active =
            ActiveGeneration { id, index, state: SlotState::Pending, cancel: cancel.clone(), started: Instant::now() };
        state.last = Some(active.slot());
        state.active = Some(active);
        self.shared.status.send_replace(GenerationStatus::Streaming { id, slot: index });
        drop(state);

        info!(
            generation_id = %id,
            provider = self.provider.name(),
            model = %settings.model,
            temperature = settings.temperature,
            credential = %mask_credential(&settings.credential),
            prompt_len = prompt.chars().count(),
            prompt = %redact_sensitive(&prompt, &self.privacy),
            slot = index,
            "Starting generation"
        );

        let request = GenerationRequest::builder()
            .prompt(prompt)
            .credential(settings.credential)
            .model(settings.model)
            .temperature(settings.temperature)
            .build();

        let driver = Driver {
            shared: Arc::clone(&self.shared),
            provider: Arc::clone(&self.provider),
            id,
            cancel,
            timeout: self.timeout,
        };
        tokio::spawn(driver.run(request).instrument(info_span!("generation", generation_id = %id)));

        SubmitOutcome::Started(id)
    }

    /// Abort the active generation, keeping whatever text already arrived.
    ///
    /// Returns the cancelled slot, or `None` when nothing was running.
    pub fn cancel(&self) -> Option<GenerationSlot> {
        let mut state = self.shared.lock();
        let mut active = state.active.take()?;
        active.cancel.cancel();
        active.state = SlotState::Cancelled;

        let slot = active.slot();
        state.last = Some(slot);
        self.shared.status.send_replace(GenerationStatus::Idle);
        info!(generation_id = %slot.id, slot = slot.index, "Generation cancelled");
        Some(slot)
    }

    pub fn is_processing(&self) -> bool {
        !self.shared.status.borrow().is_idle()
    }

    pub fn status(&self) -> GenerationStatus {
        *self.shared.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<GenerationStatus> {
        self.shared.status.subscribe()
    }

    /// Most recent slot, including ones settled without streaming
    pub fn last_slot(&self) -> Option<GenerationSlot> {
        self.shared.lock().last
    }

    /// Wait until nothing is in flight and return the most recent slot.
    pub async fn wait_idle(&self) -> Option<GenerationSlot> {
        let mut rx = self.shared.status.subscribe();
        // The sender lives in `shared`, which we hold, so this cannot observe a closed channel.
        let _ = rx.wait_for(GenerationStatus::is_idle).await;
        self.last_slot()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if let Some(active) = self.shared.lock().active.as_ref() {
            active.cancel.cancel();
        }
    }
}

/// Owns one generation's stream from the spawned task
struct Driver {
    shared: Arc<Shared>,
    provider: Arc<dyn Provider>,
    id: GenerationId,
    cancel: CancelToken,
    timeout: Option<Duration>,
}

enum Step {
    Next(Option<GenerationResult<String>>),
    Cancelled,
}

impl Driver {
    async fn run(self, request: GenerationRequest) {
        let result = self.stream_into_slot(request).await;

        match result {
            Ok(()) => {
                self.shared.finish(self.id, SlotState::Complete, None);
            }
            Err(GenerationError::Cancelled) => {
                self.shared.finish(self.id, SlotState::Cancelled, None);
            }
            Err(GenerationError::MissingCredential) => {
                self.shared
                    .finish(self.id, SlotState::Failed, Some(MISSING_KEY_MESSAGE.to_string()));
            }
            Err(e) => {
                warn!(generation_id = %self.id, error = %e, "Generation failed");
                self.cancel.cancel();
                self.shared.finish(self.id, SlotState::Failed, Some(failure_message(&e)));
            }
        }
    }

    async fn stream_into_slot(&self, request: GenerationRequest) -> GenerationResult<()> {
        let mut stream = self.provider.stream_generate(request, self.cancel.clone()).await?;
        let mut fragments = 0usize;

        loop {
            let step = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Step::Cancelled,
                next = next_within(&mut stream, self.timeout) => Step::Next(next?),
            };

            let fragment = match step {
                Step::Cancelled => return Err(GenerationError::Cancelled),
                Step::Next(None) => {
                    debug!(generation_id = %self.id, fragments, "Stream ended");
                    return Ok(());
                }
                Step::Next(Some(fragment)) => fragment?,
            };

            if !self.shared.apply_fragment(self.id, &fragment) {
                return Err(GenerationError::Cancelled);
            }
            fragments += 1;
        }
    }
}

async fn next_within<S>(stream: &mut S, limit: Option<Duration>) -> GenerationResult<Option<S::Item>>
where
    S: futures::Stream + Unpin,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, stream.next())
            .await
            .map_err(|_| GenerationError::Timeout(limit)),
        None => Ok(stream.next().await),
    }
}

/// Output entry that replaces a failed generation
pub fn failure_message(error: &GenerationError) -> String {
    format!("{FAILURE_PREFIX}{error}")
}
