mod concurrency;
mod conversation;
mod timeout;
