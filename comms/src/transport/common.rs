use std::pin::Pin;

use futures_util::Stream;

pub type BoxedStream<Item> = Pin<Box<dyn Stream<Item = Item> + Send>>;
