//! Run Controller
//!
//! Drives `runs x functions` generation requests (run index outer, function
//! inner) against a `CompletionBackend`, parses every reply and aggregates the
//! batches into one `ExampleSet`.

use super::aggregate::Aggregator;
use super::backend::{CompletionBackend, OllamaBackend};
use super::parser::{parse_batch, Batch};
use super::prompt::FewShotTemplate;
use super::{ExampleSet, GenerationRequest};
use crate::core::config::{FailurePolicy, GeneratorConfig};
use crate::core::hints::HintBook;
use crate::core::tools::ToolRegistry;
use crate::error::{GenerationError, GenerationResult, SynthError, SynthResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Execution knobs for a `RunController`
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub request_timeout: Duration,
    pub max_concurrency: usize,
    pub on_failure: FailurePolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            request_timeout: Duration::from_secs(120),
            max_concurrency: 1,
            on_failure: FailurePolicy::Skip,
        }
    }
}

impl From<&GeneratorConfig> for RunOptions {
    fn from(config: &GeneratorConfig) -> Self {
        RunOptions {
            request_timeout: config.model.request_timeout(),
            max_concurrency: config.max_concurrency.max(1),
            on_failure: config.on_failure,
        }
    }
}

pub struct RunController {
    backend: Arc<dyn CompletionBackend>,
    hints: HintBook,
    template: Arc<FewShotTemplate>,
    options: RunOptions,
}

impl RunController {
    pub fn new(backend: Arc<dyn CompletionBackend>, registry: Arc<ToolRegistry>) -> Self {
        RunController {
            backend,
            hints: HintBook::new(registry),
            template: Arc::new(FewShotTemplate::default()),
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_template(mut self, template: FewShotTemplate) -> Self {
        self.template = Arc::new(template);
        self
    }

    /// Every request a `generate` call would issue, in sequential order.
    pub fn requests(
        &self,
        function_names: &[String],
        num_examples: usize,
        runs: usize,
    ) -> Vec<GenerationRequest> {
        let mut requests = Vec::with_capacity(runs * function_names.len());
        for run_index in 0..runs {
            for name in function_names {
                let hints = self.hints.hints(name, num_examples);
                requests.push(GenerationRequest {
                    function_name: name.clone(),
                    subject_hint: hints.subject,
                    extra_hint: hints.extra,
                    num_examples,
                    run_index,
                });
            }
        }
        requests
    }

    pub async fn generate(
        &self,
        function_names: &[String],
        randomize: bool,
        num_examples: usize,
        runs: usize,
    ) -> SynthResult<ExampleSet> {
        let started = Instant::now();
        let requests = self.requests(function_names, num_examples, runs);
        info!(
            "🧬 [RunController] {} requests via {} ({} functions x {} runs)",
            requests.len(),
            self.backend.name(),
            function_names.len(),
            runs
        );

        let batches = if self.options.max_concurrency <= 1 {
            self.run_sequential(requests).await?
        } else {
            self.run_concurrent(requests).await?
        };

        let mut aggregator = Aggregator::new();
        for batch in batches {
            aggregator.push(batch);
        }
        let set = aggregator.finish(randomize);

        info!(
            "✅ [RunController] Done in {:.2}s",
            started.elapsed().as_secs_f64()
        );
        Ok(set)
    }

    async fn run_sequential(&self, requests: Vec<GenerationRequest>) -> SynthResult<Vec<Batch>> {
        let mut batches = Vec::with_capacity(requests.len());
        for request in requests {
            info!(
                "[RunController] Generating data for {}, run number {}",
                request.function_name, request.run_index
            );
            let result = execute(
                self.backend.as_ref(),
                &self.template,
                &request,
                self.options.request_timeout,
            )
            .await;
            batches.push(self.settle(&request, result)?);
        }
        Ok(batches)
    }

    /// Bounded fan-out; batches are put back in sequential order before returning
    /// so aggregation sees the same sequence as `run_sequential`.
    async fn run_concurrent(&self, requests: Vec<GenerationRequest>) -> SynthResult<Vec<Batch>> {
        let permits = Arc::new(Semaphore::new(self.options.max_concurrency));
        let mut tasks = JoinSet::new();
        let total = requests.len();

        for (index, request) in requests.into_iter().enumerate() {
            let backend = self.backend.clone();
            let template = self.template.clone();
            let permits = permits.clone();
            let timeout = self.options.request_timeout;

            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => {
                        info!(
                            "[RunController] Generating data for {}, run number {}",
                            request.function_name, request.run_index
                        );
                        execute(backend.as_ref(), &template, &request, timeout).await
                    }
                    Err(_) => Err(GenerationError::Backend("worker pool closed".to_string())),
                };
                (index, request, result)
            });
        }

        let mut slots: Vec<Option<Batch>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            let (index, request, result) = joined?;
            match self.settle(&request, result) {
                Ok(batch) => slots[index] = Some(batch),
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    fn settle(
        &self,
        request: &GenerationRequest,
        result: GenerationResult<Batch>,
    ) -> SynthResult<Batch> {
        match result {
            Ok(batch) => Ok(batch),
            Err(source) => match self.options.on_failure {
                FailurePolicy::Skip => {
                    warn!(
                        "⚠️ [RunController] {} run {} failed, counting {} as failed: {}",
                        request.function_name, request.run_index, request.num_examples, source
                    );
                    Ok(Batch::failed(request.num_examples))
                }
                FailurePolicy::Abort => Err(SynthError::Generation {
                    function: request.function_name.clone(),
                    run: request.run_index,
                    source,
                }),
            },
        }
    }
}

/// One backend call with a single internal run, parsed into a batch.
async fn execute(
    backend: &dyn CompletionBackend,
    template: &FewShotTemplate,
    request: &GenerationRequest,
    timeout: Duration,
) -> GenerationResult<Batch> {
    let call = backend.complete(template, &request.subject_hint, &request.extra_hint, 1);
    let outputs = match tokio::time::timeout(timeout, call).await {
        Ok(result) => result?,
        Err(_) => return Err(GenerationError::Timeout(timeout)),
    };

    let text = outputs
        .into_iter()
        .next()
        .ok_or(GenerationError::EmptyResponse)?;
    Ok(parse_batch(&text))
}

/// Build an Ollama-backed controller over the builtin tool catalog and run `config`.
pub async fn run(config: &GeneratorConfig) -> SynthResult<ExampleSet> {
    config.validate()?;

    let backend = OllamaBackend::new(config.model.clone())
        .map_err(|e| SynthError::Config(format!("cannot build Ollama client: {}", e)))?;
    let controller = RunController::new(Arc::new(backend), Arc::new(ToolRegistry::builtin()))
        .with_options(RunOptions::from(config));

    controller
        .generate(
            &config.functions,
            config.randomize,
            config.num_examples,
            config.runs,
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::canonical_key;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    type Reply = Box<dyn Fn(&str) -> GenerationResult<Vec<String>> + Send + Sync>;

    /// Replies via a closure over the subject hint and records every call.
    struct ScriptedBackend {
        reply: Reply,
        delay: Duration,
        slow: Option<(&'static str, Duration)>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl ScriptedBackend {
        fn new<F>(reply: F) -> Self
        where
            F: Fn(&str) -> GenerationResult<Vec<String>> + Send + Sync + 'static,
        {
            ScriptedBackend {
                reply: Box::new(reply),
                delay: Duration::ZERO,
                slow: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        /// Delay only the calls for `function`.
        fn with_slow_function(mut self, function: &'static str, delay: Duration) -> Self {
            self.slow = Some((function, delay));
            self
        }

        fn calls(&self) -> Vec<(String, usize)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _template: &FewShotTemplate,
            subject: &str,
            _extra: &str,
            runs: usize,
        ) -> GenerationResult<Vec<String>> {
            self.calls.lock().push((subject.to_string(), runs));
            let delay = match self.slow {
                Some((function, delay)) if function_of(subject) == function => delay,
                _ => self.delay,
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            (self.reply)(subject)
        }
    }

    fn record(query: &str, function: &str) -> String {
        format!(
            r#"{{"query": "{}", "answer": {{"function": "{}", "arguments": {{"x": "1"}}}}}}"#,
            query, function
        )
    }

    fn function_of(subject: &str) -> &'static str {
        if subject.contains("power") {
            "power"
        } else if subject.contains("zodiac") {
            "zodiac_sign"
        } else {
            "unknown"
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn controller(backend: Arc<ScriptedBackend>) -> RunController {
        RunController::new(backend, Arc::new(ToolRegistry::builtin()))
    }

    #[tokio::test]
    async fn runs_are_outer_and_functions_inner() {
        let backend = Arc::new(ScriptedBackend::new(|subject| {
            Ok(vec![record("q", function_of(subject))])
        }));
        controller(backend.clone())
            .generate(&names(&["power", "zodiac_sign"]), false, 2, 2)
            .await
            .unwrap();

        let order: Vec<_> = backend
            .calls()
            .iter()
            .map(|(subject, runs)| {
                assert_eq!(*runs, 1);
                function_of(subject)
            })
            .collect();
        assert_eq!(order, ["power", "zodiac_sign", "power", "zodiac_sign"]);
    }

    #[tokio::test]
    async fn repeated_runs_dedupe_but_count_everything() {
        let backend = Arc::new(ScriptedBackend::new(|_| {
            Ok(vec![format!(
                "{}\n\n{}\n\nnot json",
                record("a", "power"),
                record("b", "power")
            )])
        }));
        let set = controller(backend)
            .generate(&names(&["power"]), false, 3, 3)
            .await
            .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.number_generated, 6);
        assert_eq!(set.number_failed, 3);
    }

    #[tokio::test]
    async fn skip_policy_counts_failed_requests() {
        let backend = Arc::new(ScriptedBackend::new(|subject| {
            match function_of(subject) {
                "zodiac_sign" => Err(GenerationError::Backend("model crashed".to_string())),
                f => Ok(vec![record("q", f)]),
            }
        }));
        let set = controller(backend)
            .generate(&names(&["power", "zodiac_sign"]), false, 5, 2)
            .await
            .unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.number_generated, 2);
        assert_eq!(set.number_failed, 10);
    }

    #[tokio::test]
    async fn abort_policy_surfaces_the_failing_pair() {
        let backend = Arc::new(ScriptedBackend::new(|subject| {
            match function_of(subject) {
                "zodiac_sign" => Err(GenerationError::EmptyResponse),
                f => Ok(vec![record("q", f)]),
            }
        }));
        let err = controller(backend)
            .with_options(RunOptions {
                on_failure: FailurePolicy::Abort,
                ..RunOptions::default()
            })
            .generate(&names(&["power", "zodiac_sign"]), false, 1, 1)
            .await
            .unwrap_err();

        match err {
            SynthError::Generation { function, run, .. } => {
                assert_eq!(function, "zodiac_sign");
                assert_eq!(run, 0);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn timeout_is_a_failed_batch() {
        let backend = Arc::new(
            ScriptedBackend::new(|_| Ok(vec![record("late", "power")]))
                .with_delay(Duration::from_millis(500)),
        );
        let set = controller(backend)
            .with_options(RunOptions {
                request_timeout: Duration::from_millis(20),
                ..RunOptions::default()
            })
            .generate(&names(&["power"]), false, 4, 1)
            .await
            .unwrap();

        assert!(set.is_empty());
        assert_eq!(set.number_failed, 4);
    }

    #[tokio::test]
    async fn empty_reply_list_is_a_failure() {
        let backend = Arc::new(ScriptedBackend::new(|_| Ok(vec![])));
        let set = controller(backend)
            .generate(&names(&["power"]), false, 2, 1)
            .await
            .unwrap();
        assert_eq!(set.number_failed, 2);
    }

    #[tokio::test]
    async fn unknown_function_still_calls_backend_with_empty_hints() {
        let backend = Arc::new(ScriptedBackend::new(|_| Ok(vec![record("q", "mystery")])));
        let set = controller(backend.clone())
            .generate(&names(&["mystery"]), false, 1, 1)
            .await
            .unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(backend.calls(), vec![(String::new(), 1)]);
    }

    #[tokio::test]
    async fn concurrent_run_matches_sequential_run() {
        let reply = |subject: &str| {
            let f = function_of(subject);
            Ok(vec![format!(
                "{}\n\n{}",
                record(&format!("{} one", f), f),
                record("shared", "power")
            )])
        };
        let functions = names(&["power", "zodiac_sign"]);

        let sequential = controller(Arc::new(ScriptedBackend::new(reply)))
            .generate(&functions, false, 2, 3)
            .await
            .unwrap();

        let concurrent = controller(Arc::new(
            ScriptedBackend::new(reply).with_delay(Duration::from_millis(5)),
        ))
        .with_options(RunOptions {
            max_concurrency: 4,
            ..RunOptions::default()
        })
        .generate(&functions, false, 2, 3)
        .await
        .unwrap();

        assert_eq!(sequential, concurrent);
        let keys: Vec<_> = concurrent.queries.iter().map(canonical_key).collect();
        assert_eq!(keys.len(), 3);
    }

    #[tokio::test]
    async fn concurrent_timeout_is_a_failed_batch() {
        let backend = Arc::new(
            ScriptedBackend::new(|subject| Ok(vec![record("q", function_of(subject))]))
                .with_slow_function("zodiac_sign", Duration::from_secs(5)),
        );
        let set = controller(backend)
            .with_options(RunOptions {
                request_timeout: Duration::from_millis(50),
                max_concurrency: 4,
                ..RunOptions::default()
            })
            .generate(&names(&["power", "zodiac_sign"]), false, 4, 2)
            .await
            .unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.number_generated, 2);
        assert_eq!(set.number_failed, 8);
    }

    #[tokio::test]
    async fn concurrent_abort_stops_outstanding_requests() {
        let backend = Arc::new(
            ScriptedBackend::new(|subject| match function_of(subject) {
                "zodiac_sign" => Err(GenerationError::Backend("model crashed".to_string())),
                f => Ok(vec![record("q", f)]),
            })
            .with_slow_function("power", Duration::from_secs(5)),
        );
        let started = Instant::now();
        let err = controller(backend)
            .with_options(RunOptions {
                max_concurrency: 4,
                on_failure: FailurePolicy::Abort,
                ..RunOptions::default()
            })
            .generate(&names(&["power", "zodiac_sign"]), false, 1, 2)
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        match err {
            SynthError::Generation { function, .. } => assert_eq!(function, "zodiac_sign"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn custom_template_reaches_backend() {
        struct RecordingBackend(Mutex<Vec<String>>);
        #[async_trait]
        impl CompletionBackend for RecordingBackend {
            fn name(&self) -> &str {
                "template"
            }

            async fn complete(
                &self,
                template: &FewShotTemplate,
                subject: &str,
                extra: &str,
                _runs: usize,
            ) -> GenerationResult<Vec<String>> {
                self.0.lock().push(template.render(subject, extra));
                Ok(vec![record("q", "power")])
            }
        }

        let backend = Arc::new(RecordingBackend(Mutex::new(Vec::new())));
        let template = FewShotTemplate::new("Only tools below.", vec![], "Go.");
        RunController::new(backend.clone(), Arc::new(ToolRegistry::builtin()))
            .with_template(template)
            .generate(&names(&["power"]), false, 1, 1)
            .await
            .unwrap();

        let prompts = backend.0.lock().clone();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Only tools below."));
    }

    #[test]
    fn requests_carry_hints_and_indices() {
        let backend = Arc::new(ScriptedBackend::new(|_| Ok(vec![])));
        let requests = controller(backend).requests(&names(&["power", "translate"]), 6, 2);

        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].function_name, "power");
        assert!(requests[0].extra_hint.ends_with("Generate 6 examples"));
        assert_eq!(requests[1].subject_hint, "");
        assert_eq!(requests[3].run_index, 1);
    }

    #[tokio::test]
    async fn run_rejects_invalid_config_before_any_request() {
        let config = GeneratorConfig::default();
        assert!(matches!(run(&config).await, Err(SynthError::Config(_))));
    }
}
