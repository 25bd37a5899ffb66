mod concurrency;
mod helpers;
