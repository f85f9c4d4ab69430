//! Stateright model checker tests for single-decree Paxos.
//!
//! Acceptors, proposers and learners are thin wrappers over the pure state
//! machines in `basic_paxos::core`, so the checker explores the same logic the
//! async runtime drives. A proposer that has no majority when its timer fires
//! prepares again in the next round, up to a bounded number of rounds.

use std::borrow::Cow;
use std::sync::Arc;

use basic_paxos::core::{AcceptorCore, LearnerCore, PrepareResult, ProposeResult, ProposerCore};
use basic_paxos::{Message, NodeId, Payload};
use stateright::actor::{Actor, ActorModel, ActorModelState, Id, Network, Out, model_timeout};
use stateright::{Checker, Expectation, Model};

type Value = u64;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum PaxosActor {
    Acceptor {
        learners: Vec<NodeId>,
    },
    Proposer {
        acceptors: Vec<NodeId>,
        initial_value: Value,
    },
    Learner {
        acceptors: Vec<NodeId>,
    },
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum PaxosActorState {
    Acceptor(AcceptorCore<Value>),
    Proposer(ProposerCore<Value>),
    Learner(LearnerCore<Value>),
}

fn node(id: Id) -> NodeId {
    NodeId(u32::try_from(usize::from(id)).expect("small model"))
}

fn send_all(messages: Vec<Message<Value>>, o: &mut Out<PaxosActor>) {
    for message in messages {
        o.send(Id::from(message.to.0 as usize), message.payload);
    }
}

impl Actor for PaxosActor {
    type Msg = Payload<Value>;
    type State = PaxosActorState;
    /// Phase 1 retry.
    type Timer = ();
    type Storage = ();
    type Random = ();

    fn on_start(
        &self,
        id: Id,
        _storage: &Option<Self::Storage>,
        o: &mut Out<Self>,
    ) -> Self::State {
        match self {
            PaxosActor::Acceptor { .. } => PaxosActorState::Acceptor(AcceptorCore::new()),
            PaxosActor::Proposer {
                acceptors,
                initial_value,
            } => {
                let mut core = ProposerCore::new(node(id), *initial_value, acceptors.clone());
                send_all(core.prepare(), o);
                o.set_timer((), model_timeout());
                PaxosActorState::Proposer(core)
            }
            PaxosActor::Learner { acceptors } => {
                PaxosActorState::Learner(LearnerCore::new(acceptors.clone()))
            }
        }
    }

    fn on_msg(
        &self,
        id: Id,
        state: &mut Cow<Self::State>,
        src: Id,
        msg: Self::Msg,
        o: &mut Out<Self>,
    ) {
        let (me, from) = (node(id), node(src));
        let current_state = state.as_ref().clone();

        match (self, current_state) {
            (PaxosActor::Acceptor { learners }, PaxosActorState::Acceptor(mut core)) => {
                let outbound = match msg {
                    Payload::Prepare { n } => match core.prepare(n) {
                        PrepareResult::Promised { n, accepted } => {
                            vec![Message::promise(me, from, n, accepted)]
                        }
                        PrepareResult::Stale { .. } => return,
                    },
                    Payload::Propose { n, value } => {
                        let result = core.propose(n, value);
                        match result.expect("proposers only propose at a promised number") {
                            ProposeResult::Accepted(proposal) => learners
                                .iter()
                                .map(|&to| Message::accept(me, to, proposal.n, proposal.value))
                                .collect(),
                            ProposeResult::Stale { .. } => return,
                        }
                    }
                    _ => return,
                };
                *state.to_mut() = PaxosActorState::Acceptor(core);
                send_all(outbound, o);
            }
            (PaxosActor::Proposer { .. }, PaxosActorState::Proposer(mut core)) => {
                let Payload::Promise { n, accepted } = msg else {
                    return;
                };
                if core.majority_reached() {
                    // phase 2 already sent
                    return;
                }
                core.receive_promise(from, n, accepted);
                let proposals = core.propose();
                *state.to_mut() = PaxosActorState::Proposer(core);
                send_all(proposals, o);
            }
            (PaxosActor::Learner { .. }, PaxosActorState::Learner(mut core)) => {
                let Payload::Accept { n, value } = msg else {
                    return;
                };
                if core.receive_accept(from, n, value) {
                    *state.to_mut() = PaxosActorState::Learner(core);
                }
            }
            _ => {}
        }
    }

    fn on_timeout(
        &self,
        _id: Id,
        state: &mut Cow<Self::State>,
        _timer: &Self::Timer,
        o: &mut Out<Self>,
    ) {
        let PaxosActorState::Proposer(core) = state.as_ref() else {
            return;
        };
        if core.majority_reached() {
            return;
        }
        let mut core = core.clone();
        let prepares = core.prepare();
        *state.to_mut() = PaxosActorState::Proposer(core);
        send_all(prepares, o);
        o.set_timer((), model_timeout());
    }
}

fn learned(state: &ActorModelState<PaxosActor>) -> impl Iterator<Item = Value> + '_ {
    state
        .actor_states
        .iter()
        .filter_map(|s: &Arc<PaxosActorState>| match s.as_ref() {
            PaxosActorState::Learner(core) => core.chosen().map(|p| p.value),
            _ => None,
        })
}

fn check_agreement(state: &ActorModelState<PaxosActor>) -> bool {
    let mut values = learned(state);
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

fn check_accepted_within_promise(state: &ActorModelState<PaxosActor>) -> bool {
    state.actor_states.iter().all(|s| match s.as_ref() {
        PaxosActorState::Acceptor(core) => core.accepted_n() <= core.promised(),
        _ => true,
    })
}

fn decided_after_retry(state: &ActorModelState<PaxosActor>) -> bool {
    state.actor_states.iter().any(|s| match s.as_ref() {
        PaxosActorState::Learner(core) => core.chosen().is_some_and(|p| p.n.round() > 1),
        _ => false,
    })
}

/// Configuration for bounding state space
#[derive(Clone)]
struct PaxosConfig {
    values: Vec<Value>,
    max_round: u32,
}

/// Acceptors take ids `0..a`, then proposers, then learners.
fn paxos_model(
    num_acceptors: usize,
    values: &[Value],
    num_learners: usize,
    max_round: u32,
) -> ActorModel<PaxosActor, PaxosConfig, ()> {
    let ids = |range: std::ops::Range<usize>| -> Vec<NodeId> {
        range.map(|i| node(Id::from(i))).collect()
    };
    let first_learner = num_acceptors + values.len();
    let acceptors = ids(0..num_acceptors);
    let learners = ids(first_learner..first_learner + num_learners);

    let cfg = PaxosConfig {
        values: values.to_vec(),
        max_round,
    };
    let mut model = ActorModel::new(cfg, ())
        .init_network(Network::new_ordered([]))
        // don't explore retries past the last allowed round
        .within_boundary(|cfg, state| {
            state
                .actor_states
                .iter()
                .all(|s: &Arc<PaxosActorState>| match s.as_ref() {
                    PaxosActorState::Proposer(core) => core.round() <= cfg.max_round,
                    _ => true,
                })
        });

    for _ in 0..num_acceptors {
        model = model.actor(PaxosActor::Acceptor {
            learners: learners.clone(),
        });
    }
    for &initial_value in values {
        model = model.actor(PaxosActor::Proposer {
            acceptors: acceptors.clone(),
            initial_value,
        });
    }
    for _ in 0..num_learners {
        model = model.actor(PaxosActor::Learner {
            acceptors: acceptors.clone(),
        });
    }

    model
        .property(Expectation::Always, "Agreement", |_, state| check_agreement(state))
        .property(Expectation::Always, "AcceptedWithinPromise", |_, state| {
            check_accepted_within_promise(state)
        })
        .property(Expectation::Always, "LearnedWasProposed", |model, state| {
            learned(state).all(|v| model.cfg.values.contains(&v))
        })
        .property(Expectation::Sometimes, "Decided", |_, state| learned(state).next().is_some())
        .property(Expectation::Sometimes, "DecidedAfterTimeout", |_, state| {
            decided_after_retry(state)
        })
}

#[test]
fn check_paxos_single_proposer() {
    let model = paxos_model(3, &[1], 2, 2);

    let checker = model.checker().threads(num_cpus::get()).spawn_bfs().join();

    checker.assert_properties();
    println!(
        "Single proposer: {} states explored",
        checker.unique_state_count()
    );
}

#[test]
fn check_paxos_two_proposers() {
    let model = paxos_model(3, &[1, 2], 2, 2);

    let checker = model.checker().threads(num_cpus::get()).spawn_bfs().join();

    checker.assert_properties();
    println!(
        "Two proposers: {} states explored",
        checker.unique_state_count()
    );
}

#[test]
fn check_paxos_retries_reach_decision() {
    let model = paxos_model(3, &[7], 1, 3);

    let checker = model.checker().threads(num_cpus::get()).spawn_bfs().join();

    checker.assert_properties();
    println!(
        "Retrying proposer: {} states explored",
        checker.unique_state_count()
    );
}
