use crate::config::{UasBuilder, UasConfig};
use crate::error::UasError;
use crate::response::{create_response, success_response};
use crate::transport::{IncomingRequest, Transport};
use bytesstr::BytesStr;
use parking_lot::Mutex;
use sip_auth::{AuthOutcome, Authenticator, ChallengeIssuer, Transaction};
use sip_types::header::HeaderError;
use sip_types::header::typed::{Allow, CSeq, CallID};
use sip_types::msg::Response;
use sip_types::uri::SipUri;
use sip_types::{Method, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

/// Transactions are identified by Call-ID and method, a retried request after a challenge
/// reuses both
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TsxKey {
    call_id: BytesStr,
    method: Method,
}

/// Entry of the transaction table
struct PendingTransaction {
    transaction: Arc<tokio::sync::Mutex<Transaction>>,
    created: Instant,
}

/// A mock SIP user agent server.
///
/// Cheap to clone, all clones share the same transactions and lifecycle.
#[derive(Clone)]
pub struct MockUas {
    inner: Arc<Inner>,
}

struct Inner {
    authenticator: Authenticator,
    methods: Vec<Method>,
    allow: Vec<Method>,
    contact: Option<SipUri>,

    /// Transactions not finished after this are dropped
    challenge_ttl: Duration,
    transactions: Mutex<HashMap<TsxKey, PendingTransaction>>,

    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl MockUas {
    pub fn builder() -> UasBuilder {
        UasBuilder::default()
    }

    pub fn new(config: UasConfig) -> Self {
        Self::with_issuer(config, ChallengeIssuer::default())
    }

    pub(crate) fn with_issuer(config: UasConfig, issuer: ChallengeIssuer) -> Self {
        let UasConfig {
            realm,
            role,
            methods,
            allow,
            credentials,
            qop,
            algorithm,
            opaque,
            resolver_timeout,
            challenge_ttl,
            contact,
        } = config;

        let authenticator = Authenticator {
            credentials,
            realm,
            issuer: issuer.algorithm(algorithm).qop(qop).opaque(opaque),
            verifier: Default::default(),
            role,
            resolver_timeout,
        };

        Self {
            inner: Arc::new(Inner {
                authenticator,
                methods,
                allow,
                contact,
                challenge_ttl,
                transactions: Mutex::new(HashMap::new()),
                cancel: CancellationToken::new(),
                tasks: TaskTracker::new(),
            }),
        }
    }

    /// Process every request received on `incoming`, each inside its own task.
    ///
    /// Runs until the channel is closed or [`MockUas::disconnect`] is called.
    pub fn listen(&self, transport: Arc<dyn Transport>, mut incoming: mpsc::Receiver<IncomingRequest>) {
        let this = self.clone();

        self.inner.tasks.spawn(async move {
            loop {
                let request = tokio::select! {
                    _ = this.inner.cancel.cancelled() => break,
                    request = incoming.recv() => match request {
                        Some(request) => request,
                        None => break,
                    },
                };

                let uas = this.clone();
                let transport = transport.clone();

                this.inner.tasks.spawn(async move {
                    if let Err(e) = uas.handle(&*transport, request).await {
                        log::warn!("failed to handle request, {e}");
                    }
                });
            }

            log::debug!("stopped listening for requests");
        });
    }

    /// Process a single request and send the response through `transport`
    pub async fn handle(
        &self,
        transport: &dyn Transport,
        request: IncomingRequest,
    ) -> Result<(), UasError> {
        let span = tracing::info_span!("request", method = %request.line.method);

        tokio::select! {
            biased;
            _ = self.inner.cancel.cancelled() => {
                log::debug!("dropping {} request, disconnected", request.line.method);
                Err(UasError::Disconnected)
            }
            result = self.process(transport, &request).instrument(span) => result,
        }
    }

    /// Stop listening, abandon all pending transactions and wait for running tasks to finish
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();
        self.inner.tasks.close();
        self.inner.tasks.wait().await;

        let abandoned = {
            let mut transactions = self.inner.transactions.lock();
            let len = transactions.len();
            transactions.clear();
            len
        };

        log::debug!("disconnected, abandoned {abandoned} transactions");
    }

    pub fn is_disconnected(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Number of transactions waiting for the client to answer a challenge
    pub fn pending_transactions(&self) -> usize {
        let mut transactions = self.inner.transactions.lock();
        self.sweep(&mut transactions);
        transactions.len()
    }

    /// Drop transactions whose challenge was not answered in time
    fn sweep(&self, transactions: &mut HashMap<TsxKey, PendingTransaction>) {
        let before = transactions.len();

        transactions.retain(|_, pending| pending.created.elapsed() < self.inner.challenge_ttl);

        let expired = before - transactions.len();
        if expired > 0 {
            log::debug!("dropped {expired} unanswered transactions");
        }
    }

    async fn process(
        &self,
        transport: &dyn Transport,
        request: &IncomingRequest,
    ) -> Result<(), UasError> {
        let method = &request.line.method;

        if *method == Method::ACK {
            log::trace!("received ACK, nothing to respond");
            return Ok(());
        }

        let call_id = match request.headers.get_named::<CallID>() {
            Ok(call_id) => call_id,
            Err(e) => return self.bad_request(transport, request, e).await,
        };

        if let Err(e) = request.headers.get_named::<CSeq>() {
            return self.bad_request(transport, request, e).await;
        }

        if !self.inner.allow.contains(method) {
            log::debug!("{method} is not allowed");

            let mut response = create_response(request, StatusCode::METHOD_NOT_ALLOWED);
            response
                .headers
                .insert_named(&Allow(self.inner.allow.clone()));

            return Ok(transport.send_response(response).await?);
        }

        if !self.inner.methods.contains(method) {
            return Ok(transport
                .send_response(success_response(request, self.inner.contact.as_ref()))
                .await?);
        }

        let key = TsxKey {
            call_id: call_id.0,
            method: method.clone(),
        };

        let (response, result) = self.authenticate(key, request).await?;

        transport.send_response(response).await?;

        result
    }

    /// Run `request` through the authentication state machine of its transaction
    async fn authenticate(
        &self,
        key: TsxKey,
        request: &IncomingRequest,
    ) -> Result<(Response, Result<(), UasError>), UasError> {
        let handle = {
            let mut transactions = self.inner.transactions.lock();
            self.sweep(&mut transactions);

            transactions
                .entry(key.clone())
                .or_insert_with(|| PendingTransaction {
                    transaction: Default::default(),
                    created: Instant::now(),
                })
                .transaction
                .clone()
        };

        let mut transaction = handle.lock().await;

        let outcome = self
            .inner
            .authenticator
            .authenticate(&mut transaction, request.into())
            .await?;

        if transaction.is_finished() {
            let mut transactions = self.inner.transactions.lock();

            // the entry may have expired and been replaced meanwhile
            if transactions
                .get(&key)
                .is_some_and(|pending| Arc::ptr_eq(&pending.transaction, &handle))
            {
                transactions.remove(&key);
            }
        }

        let response = match outcome {
            AuthOutcome::ChallengeRequired(challenge) => {
                log::debug!("challenging {} with {:?}", key.method, challenge.code());

                let mut response = create_response(request, challenge.code());
                challenge.insert_into(&mut response.headers);
                response
            }
            AuthOutcome::Accepted { username, realm } => {
                log::info!("accepted {} from {username} in realm {realm}", key.method);

                success_response(request, self.inner.contact.as_ref())
            }
            AuthOutcome::Rejected(reason) => {
                log::info!("rejecting {}, {reason}", key.method);

                create_response(request, StatusCode::FORBIDDEN)
            }
            AuthOutcome::Failed(e) => {
                return Ok((
                    create_response(request, StatusCode::SERVER_INTERNAL_ERROR),
                    Err(UasError::Resolver(e)),
                ));
            }
        };

        Ok((response, Ok(())))
    }

    async fn bad_request(
        &self,
        transport: &dyn Transport,
        request: &IncomingRequest,
        error: HeaderError,
    ) -> Result<(), UasError> {
        log::warn!("rejecting malformed {} request, {error}", request.line.method);

        transport
            .send_response(create_response(request, StatusCode::BAD_REQUEST))
            .await?;

        Err(UasError::Header(error))
    }
}
