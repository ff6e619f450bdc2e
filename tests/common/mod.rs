#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use essay_tutor::clients::TextGenerator;
use essay_tutor::services::{Backoff, ResilientInvoker, RetryPolicy};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// 按脚本依次返回回复或错误的文本生成器，脚本用完后一直失败
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|step| step.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// 追加回复
    pub fn push(&self, reply: &str) {
        self.script.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => Err(anyhow::anyhow!(e)),
            None => Err(anyhow::anyhow!("roteiro esgotado")),
        }
    }
}

/// 不等待的重试策略
pub fn no_wait(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: Backoff::Constant(Duration::ZERO),
    }
}

pub fn invoker(generator: Arc<ScriptedGenerator>, max_attempts: u32) -> ResilientInvoker {
    ResilientInvoker::new(generator, no_wait(max_attempts))
}

/// 统计 WARN / ERROR 事件数量的 tracing Layer
#[derive(Clone, Default)]
pub struct EventCounter {
    warnings: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
}

impl EventCounter {
    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for EventCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        match *event.metadata().level() {
            Level::WARN => {
                self.warnings.fetch_add(1, Ordering::SeqCst);
            }
            Level::ERROR => {
                self.errors.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
    }
}

/// 在当前线程安装计数器，guard 释放前有效
pub fn count_events() -> (EventCounter, tracing::subscriber::DefaultGuard) {
    let counter = EventCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (counter, guard)
}

pub const ESSAY: &str = "A educação é a base da sociedade. Muitos jovens vai a escola sem \
motivação, e isso prejudica o futuro do país. Portanto o governo deve investir em \
programas de incentivo.";

/// 一份完整的评分回复
pub const ANALYSIS_REPLY: &str = "[INÍCIO DA ANÁLISE]

1. Domínio da Norma Culta (0-200 pontos):
120/200
Concordância: \"jovens vai\" deveria ser \"jovens vão\". Crase: \"a escola\" exige acento grave.

2. Compreensão do Tema (0-200 pontos):
200/200
Tema bem compreendido.

3. Seleção e Organização das Informações (0-200 pontos):
160/200
Boa progressão.

4. Conhecimento dos Mecanismos Linguísticos (0-200 pontos):
120/200
Conectivos: faltam conectivos entre os parágrafos.

5. Proposta de Intervenção (0-200 pontos):
80/200
Proposta vaga, sem agente detalhado.

Nota Total: 680/1000

Comentário Geral:
Texto claro, mas com problemas gramaticais.

Competências que precisam de mais atenção:
Domínio da Norma Culta e Proposta de Intervenção

[FIM DA ANÁLISE]

Convite para Trilha de Aprendizado:
Deseja iniciar uma trilha personalizada?";
