// self
use crate::{_prelude::*, obs::FlowKind};

#[cfg(feature = "tracing")]
type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
#[cfg(not(feature = "tracing"))]
type InstrumentedFlow<F> = F;

/// Span wrapped around every strategy flow; a no-op unless `tracing` is enabled.
#[derive(Clone, Debug)]
pub(crate) struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	pub(crate) fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("feideconnect_oauth2.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Runs a synchronous flow step inside the span.
	pub(crate) fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(f)
		}
		#[cfg(not(feature = "tracing"))]
		{
			f()
		}
	}

	/// Instruments an async flow without holding a guard across `.await` points.
	pub(crate) fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}
