mod detector;
