mod binding;
mod codecs;
mod round_trip;
