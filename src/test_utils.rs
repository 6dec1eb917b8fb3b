//! テスト用ユーティリティ
//!
//! AI エンドポイントの代わりに使うスクリプト化されたトランスポートを提供します。
#![cfg(test)]

use std::collections::VecDeque;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use std::sync::{
    Arc,
    Mutex,
};
use std::time::Duration;

use async_trait::async_trait;

use crate::ai::{
    ClientOptions,
    CompletionClient,
    CompletionRequest,
    CompletionTransport,
    TransportError,
};
use crate::config::Settings;

/// 応答の種類
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// 完了テキストを返す
    Text(String),
    /// 非 2xx ステータスを返す
    Status(u16, String),
    /// 応答しない（タイムアウト用）
    Hang,
}

impl Reply {
    pub(crate) fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub(crate) fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status(status, body.into())
    }
}

/// 応答を決める関数
type Responder = Box<dyn Fn(&str) -> Reply + Send + Sync>;

/// プロンプトごとの待ち時間を決める関数
type Delay = Box<dyn Fn(&str) -> Duration + Send + Sync>;

/// 決められた応答を返すトランスポート
///
/// 送られたプロンプトを記録し、同時に処理中だったリクエスト数の最大値を計測する。
pub(crate) struct ScriptedTransport {
    /// キューが空のときに使う応答関数
    responder: Responder,
    /// 先頭から順に返す応答
    queue: Mutex<VecDeque<Reply>>,
    /// 受け取ったプロンプト
    prompts: Mutex<Vec<String>>,
    /// 各応答の前の待ち時間
    delay: Delay,
    /// 処理中のリクエスト数
    in_flight: AtomicUsize,
    /// 処理中リクエスト数の最大値
    max_in_flight: AtomicUsize,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport").field("calls", &self.call_count()).finish_non_exhaustive()
    }
}

impl ScriptedTransport {
    /// プロンプトから応答を決める
    pub(crate) fn with_responder(
        responder: impl Fn(&str) -> Reply + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::with_delay(Duration::ZERO, responder)
    }

    /// 各応答の前に `delay` 待つ
    pub(crate) fn with_delay(
        delay: Duration,
        responder: impl Fn(&str) -> Reply + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::with_delays(move |_| delay, responder)
    }

    /// プロンプトに応じた時間だけ待ってから応答する（完了順を入れ替えるため）
    pub(crate) fn with_delays(
        delay: impl Fn(&str) -> Duration + Send + Sync + 'static,
        responder: impl Fn(&str) -> Reply + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self::build(Box::new(responder), Box::new(delay)))
    }

    /// 順番に応答し、尽きたら不正な応答を返す
    pub(crate) fn queue(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        let transport =
            Self::build(Box::new(|_| Reply::text("<script exhausted>")), Box::new(|_| Duration::ZERO));
        if let Ok(mut queue) = transport.queue.lock() {
            queue.extend(replies);
        }
        Arc::new(transport)
    }

    /// 常に同じ応答を返す
    pub(crate) fn repeat(reply: Reply) -> Arc<Self> {
        Self::with_responder(move |_| reply.clone())
    }

    fn build(responder: Responder, delay: Delay) -> Self {
        Self {
            responder,
            queue: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, prompt: &str) -> Reply {
        let queued = self.queue.lock().ok().and_then(|mut queue| queue.pop_front());
        queued.unwrap_or_else(|| (self.responder)(prompt))
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = (self.delay)(&request.prompt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let reply = self.next_reply(&request.prompt);
        if matches!(reply, Reply::Hang) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Status(status, body) => Err(TransportError::Status { status, body }),
            Reply::Hang => Err(TransportError::EmptyCompletion),
        }
    }
}

/// テスト用の `CompletionClient` を作成する
pub(crate) fn client_with(transport: &Arc<ScriptedTransport>, max_retries: u32) -> CompletionClient {
    CompletionClient::new(
        Arc::clone(transport) as Arc<dyn CompletionTransport>,
        ClientOptions {
            model: "test-model".to_string(),
            max_tokens: 1024,
            max_retries,
            request_timeout: Duration::from_secs(5),
            max_in_flight: 64,
        },
    )
}

/// 設定どおりの `CompletionClient` を作成する
pub(crate) fn client_for(transport: &Arc<ScriptedTransport>, settings: &Settings) -> CompletionClient {
    CompletionClient::new(
        Arc::clone(transport) as Arc<dyn CompletionTransport>,
        ClientOptions::from_settings(settings),
    )
}

/// 翻訳バッチのプロンプトから入力 JSON を取り出す
///
/// 再試行の注意書きが後ろに付いていても最初の JSON 値だけを読む。
pub(crate) fn batch_payload(prompt: &str) -> Option<serde_json::Value> {
    let start = prompt.find("Input:\n")? + "Input:\n".len();
    serde_json::Deserializer::from_str(prompt.get(start..)?)
        .into_iter::<serde_json::Value>()
        .next()?
        .ok()
}

/// 翻訳テキストのプロンプトから原文を取り出す
pub(crate) fn text_payload(prompt: &str) -> Option<&str> {
    let start = prompt.find("Text:\n")? + "Text:\n".len();
    let rest = prompt.get(start..)?;
    Some(rest.split_once("\n\nIMPORTANT:").map_or(rest, |(text, _)| text))
}
