mod alerts;
mod common;
mod notifier;
