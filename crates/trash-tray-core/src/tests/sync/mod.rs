mod coalescer;
mod monitor;
mod synchronizer;
mod watch;
