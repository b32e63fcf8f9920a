// all integration tests share one binary (and one link step)
mod health_check;
mod helpers;
mod lists;
